//! Verarta Effects - Real Chain and Wallet Handlers
//!
//! [`CleosHandler`] implements [`verarta_core::ChainEffects`] and
//! [`verarta_core::WalletEffects`] by running the node's `cleos` tool and,
//! for protocol-feature scheduling, calling the producer HTTP API directly.
//!
//! All interpretation of tool output is confined here: [`output`] parses the
//! text `cleos` prints on success and [`classify`] decides which failures
//! mean "already satisfied". Callers only see typed
//! [`verarta_core::CallOutcome`]s.

#![forbid(unsafe_code)]

/// Recognition of "already satisfied" failures
pub mod classify;

/// `cleos`-backed handler
pub mod cleos;

/// Parsers for `cleos` success output
pub mod output;

pub use cleos::{CleosHandler, Invocation};
pub use output::OutputError;
