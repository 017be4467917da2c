//! Transaction submission
//!
//! Turns a pending invocation plus a sender identity into a broadcast
//! transaction. The sender is injected per call; the submitter holds no
//! signer state of its own.

use std::sync::Arc;

use tracing::{debug, info};

use crate::contract::PendingInvocation;
use crate::error::{Error, Result};
use crate::types::TxHash;
use crate::utils::Address;
use crate::wallet::{TransactionRequest, WalletProvider};

/// Dispatches pending invocations to the wallet for signing and broadcast
pub struct TransactionSubmitter {
    wallet: Arc<dyn WalletProvider>,
}

impl TransactionSubmitter {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }

    /// Sign and broadcast an invocation, returning its transaction hash
    ///
    /// Requires an active sender account (`NoSigner` otherwise). Suspends
    /// only for the signature/broadcast round trip; confirmation is the
    /// poller's job.
    pub async fn submit(
        &self,
        invocation: &PendingInvocation,
        sender: Option<&Address>,
    ) -> Result<TxHash> {
        let sender = sender.ok_or(Error::NoSigner)?;

        let request = TransactionRequest {
            from: sender.clone(),
            to: invocation.to.clone(),
            data: invocation.data.clone(),
        };
        debug!(operation = %invocation.operation, from = %sender, "Submitting transaction");

        let hash = self.wallet.send_transaction(&request).await?;
        info!(operation = %invocation.operation, tx = %hash, "Transaction broadcast accepted");
        Ok(hash)
    }
}
