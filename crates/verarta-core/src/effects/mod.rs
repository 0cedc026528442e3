//! Effect interfaces for the external node and wallet service
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `verarta-effects` (`CleosHandler`), `verarta-testkit`
//!   (`MockChainHandler`)
//! - **Usage**: key generation and the bootstrap orchestrator
//!
//! Every call returns a [`CallOutcome`]: either the call was applied, or the
//! service reported that the requested state already holds (account exists,
//! key already imported, ...). Handlers are responsible for recognising the
//! latter; callers only ever inspect the variant.

use serde::Serialize;
use std::io;

mod chain;
mod wallet;

pub use chain::{ActionRequest, ChainEffects};
pub use wallet::WalletEffects;

/// Result type for a single external call
pub type ClientResult<T = ()> = Result<CallOutcome<T>, ClientError>;

/// How the external service answered a state-changing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallOutcome<T = ()> {
    /// The call changed external state
    Applied(T),
    /// The requested state was already in place; nothing changed
    AlreadySatisfied { reason: String },
}

impl<T> CallOutcome<T> {
    pub fn already_satisfied(reason: impl Into<String>) -> Self {
        Self::AlreadySatisfied {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Discard the payload, keeping only applied/satisfied
    pub fn map_unit(self) -> CallOutcome<()> {
        match self {
            Self::Applied(_) => CallOutcome::Applied(()),
            Self::AlreadySatisfied { reason } => CallOutcome::AlreadySatisfied { reason },
        }
    }
}

/// Failures talking to the node or wallet service
///
/// Command strings carried here are already redacted by the handler.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed{}: {stderr}", exit_code_suffix(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("unexpected output from `{command}`: {reason}")]
    MalformedOutput { command: String, reason: String },
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}
