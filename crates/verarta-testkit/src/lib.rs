//! Verarta Testing Infrastructure
//!
//! Stand-ins for the external node and wallet service, plus fixtures for
//! registries and producer config directories.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! verarta-testkit = { path = "../verarta-testkit" }
//! ```
//!
//! ```rust,no_run
//! use verarta_testkit::{fixtures, MockChainHandler};
//!
//! # async fn example() {
//! let chain = MockChainHandler::new().with_existing_account("producer1");
//! let registry = fixtures::registry(2, 1);
//! // ... run the code under test against `chain`, then inspect `chain.calls().await`
//! # }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod mock_chain;

pub use mock_chain::{MockChainHandler, RecordedCall};
