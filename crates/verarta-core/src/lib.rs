//! Verarta Core - Testnet Bootstrap Foundation
//!
//! This crate holds the types every other bootstrap crate agrees on. It has
//! no knowledge of how the node or wallet is reached; that lives in
//! `verarta-effects` (real `cleos` handler) and `verarta-testkit` (mock).
//!
//! # Contents
//!
//! - [`account`]: validated account names, key pairs and account records
//! - [`registry`]: the persisted [`AccountRegistry`] with atomic writes
//! - [`effects`]: [`ChainEffects`] and [`WalletEffects`], the typed boundary
//!   to the external node and wallet service
//! - [`config`]: [`BootstrapSettings`] loaded from TOML plus environment
//! - [`persist`]: temp-file-and-rename helper shared by every writer

#![forbid(unsafe_code)]

/// Account names, key pairs and account records
pub mod account;

/// Bootstrap settings loaded from TOML and the environment
pub mod config;

/// Effect interfaces for the node and wallet service
pub mod effects;

/// Atomic file replacement
pub mod persist;

/// Persisted account registry
pub mod registry;

pub use account::{AccountName, AccountNameError, AccountRecord, KeyPair};
pub use config::{
    BootstrapSettings, ConfigError, GovernanceSettings, KeygenSettings, TokenSettings,
};
pub use effects::{
    ActionRequest, CallOutcome, ChainEffects, ClientError, ClientResult, WalletEffects,
};
pub use registry::{AccountRegistry, RegistryError};
