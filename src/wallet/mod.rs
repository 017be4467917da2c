//! Wallet provider seam and identity binding
//!
//! Signing lives outside the engine: an external wallet reveals accounts and
//! signs/broadcasts transactions. The engine only holds the resulting
//! [`Address`] as the active signer for the session.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::TxHash;
use crate::utils::Address;

/// An unsigned transaction handed to the wallet for signing and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

impl fmt::Display for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransactionRequest( from={}, to={}, data={} bytes )",
            self.from,
            self.to,
            self.data.len()
        )
    }
}

/// External wallet provider
///
/// Implementations map a user decline to [`Error::SubmissionRejected`] and a
/// node-level rejection of the broadcast to [`Error::BroadcastError`]; a
/// denied `enable` request maps to [`Error::UserRejected`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to reveal its accounts
    async fn enable(&self) -> Result<Vec<String>>;

    /// Sign and broadcast a transaction, returning its hash once the
    /// broadcast is accepted. Does not wait for confirmation.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash>;
}

/// Obtains and holds nothing itself: resolves the active signing account
/// from the configured wallet provider on demand
///
/// There is no automatic reconnection; after any provider-level disconnect
/// the caller must invoke [`IdentityBinder::connect`] again.
pub struct IdentityBinder {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl IdentityBinder {
    /// Create a binder over an external wallet provider
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Create a binder with no provider; every connect fails `WalletUnavailable`
    pub fn unavailable() -> Self {
        Self { provider: None }
    }

    /// Request the wallet to reveal accounts and bind the first one
    pub async fn connect(&self) -> Result<Address> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            Error::wallet_unavailable("no wallet provider is configured for this session")
        })?;

        debug!("Requesting accounts from wallet provider");
        let accounts = provider.enable().await?;
        let first = accounts
            .first()
            .ok_or_else(|| Error::user_rejected("wallet revealed no accounts"))?;

        let account = Address::parse(first)?;
        info!(account = %account, "Wallet connected");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticWallet {
        accounts: Vec<String>,
    }

    #[async_trait]
    impl WalletProvider for StaticWallet {
        async fn enable(&self) -> Result<Vec<String>> {
            if self.accounts.is_empty() {
                return Err(Error::user_rejected("user closed the prompt"));
            }
            Ok(self.accounts.clone())
        }

        async fn send_transaction(&self, _tx: &TransactionRequest) -> Result<TxHash> {
            Err(Error::SubmissionRejected("not supported".to_string()))
        }
    }

    #[tokio::test]
    async fn test_connect_binds_first_account() {
        let wallet = StaticWallet {
            accounts: vec![
                "0x1111111111111111111111111111111111111111".to_string(),
                "0x2222222222222222222222222222222222222222".to_string(),
            ],
        };
        let binder = IdentityBinder::new(Arc::new(wallet));
        let account = binder.connect().await.unwrap();
        assert_eq!(account.as_str(), "0x1111111111111111111111111111111111111111");
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let binder = IdentityBinder::unavailable();
        let err = binder.connect().await.unwrap_err();
        assert!(matches!(err, Error::WalletUnavailable(_)));
    }

    #[tokio::test]
    async fn test_connect_user_rejection() {
        let binder = IdentityBinder::new(Arc::new(StaticWallet { accounts: vec![] }));
        let err = binder.connect().await.unwrap_err();
        assert!(matches!(err, Error::UserRejected(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_account() {
        let binder = IdentityBinder::new(Arc::new(StaticWallet {
            accounts: vec!["garbage".to_string()],
        }));
        let err = binder.connect().await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }
}
