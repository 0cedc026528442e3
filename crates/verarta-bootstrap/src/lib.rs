//! Verarta testnet bootstrap
//!
//! The three provisioning tasks behind the `generate-accounts`,
//! `update-producer-configs` and `bootstrap` binaries:
//!
//! - [`keygen`]: generate one key pair per producer and user and persist the
//!   [`AccountRegistry`](verarta_core::AccountRegistry)
//! - [`producer_config`]: write each producer's signing key into its node
//!   config file
//! - [`orchestrator`]: drive the node and wallet service through the ten-step
//!   bootstrap plan
//!
//! All three talk to the outside world only through the effect traits in
//! `verarta-core`, so they run unchanged against `cleos` or the in-memory
//! mocks in `verarta-testkit`.

pub mod keygen;
pub mod orchestrator;
pub mod producer_config;

pub use keygen::{
    generate_registry, generate_registry_file, write_registry, KeyPairGenerator, KeygenError,
};
pub use orchestrator::{
    BootstrapError, BootstrapOrchestrator, BootstrapPlan, BootstrapState, BootstrapStep,
    ConsoleProgress, IdempotencyPolicy, ProgressReporter, RunReport, StepAction,
};
pub use producer_config::{ConfigDocument, ConfigSynchronizer, SyncError, SyncReport, SyncWarning};
