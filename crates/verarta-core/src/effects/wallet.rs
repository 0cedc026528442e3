//! Wallet-service effects

use super::ClientResult;
use async_trait::async_trait;

/// Operations against the wallet service, independent of the node endpoint
#[async_trait]
pub trait WalletEffects: Send + Sync {
    /// Create a wallet, returning the password the service generated for it
    async fn create_wallet(&self, wallet: &str) -> ClientResult<String>;

    async fn unlock_wallet(&self, wallet: &str, password: &str) -> ClientResult;

    /// Import a private key so the wallet can sign with it
    async fn import_key(&self, wallet: &str, private_key: &str) -> ClientResult;
}
