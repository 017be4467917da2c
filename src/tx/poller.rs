//! Confirmation polling
//!
//! Repeatedly queries the ledger for a transaction receipt, sleeping a fixed
//! interval between attempts when none is available yet. "No receipt yet"
//! retries forever; a hard error from the receipt query aborts the poll.
//! Callers that cannot afford an unbounded wait use
//! [`ConfirmationPoller::await_confirmation_with`], which adds a deadline and
//! a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::rpc::LedgerRpc;
use crate::types::{Receipt, TxHash};

/// Fires the cancellation of an in-flight poll
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Abandon the poll; the waiting caller resolves with `Cancelled`
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observed by the poll loop; resolves when the paired handle fires
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a connected handle/token pair
    pub fn new() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
    }

    /// A token that never fires, for callers that opt out of cancellation
    pub fn never() -> CancelToken {
        let (_handle, token) = Self::new();
        token
    }

    fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    async fn cancelled(&mut self) {
        // The handle may already be dropped; in that case the token can
        // never fire and we park forever, which select! handles fine.
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Resolves transaction hashes to finalized receipts
pub struct ConfirmationPoller {
    rpc: Arc<dyn LedgerRpc>,
    interval: Duration,
}

impl ConfirmationPoller {
    pub fn new(rpc: Arc<dyn LedgerRpc>, interval: Duration) -> Self {
        Self { rpc, interval }
    }

    /// Poll until the ledger reports a receipt for `hash`
    ///
    /// No upper bound: suspends indefinitely if the transaction never
    /// finalizes. Prefer [`Self::await_confirmation_with`] in interactive
    /// flows.
    pub async fn await_confirmation(&self, hash: &TxHash) -> Result<Receipt> {
        loop {
            match self.rpc.transaction_receipt(hash).await? {
                Some(receipt) => {
                    debug!(tx = %hash, epoch = ?receipt.epoch_number, "Receipt received");
                    return Ok(receipt);
                }
                None => {
                    trace!(tx = %hash, "No receipt yet");
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }

    /// Poll with an optional deadline and a cancellation token
    ///
    /// Resolves `Timeout` when the deadline expires and `Cancelled` when the
    /// token fires; either way the suspended poll is dropped, not leaked.
    pub async fn await_confirmation_with(
        &self,
        hash: &TxHash,
        deadline: Option<Duration>,
        mut cancel: CancelToken,
    ) -> Result<Receipt> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(hash.to_string()));
        }

        let poll = self.await_confirmation(hash);
        tokio::pin!(poll);

        let wait = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(wait);

        tokio::select! {
            result = &mut poll => result,
            _ = cancel.cancelled() => {
                warn!(tx = %hash, "Confirmation polling cancelled");
                Err(Error::Cancelled(hash.to_string()))
            }
            _ = &mut wait => {
                warn!(tx = %hash, ?deadline, "Confirmation polling timed out");
                Err(Error::Timeout(hash.to_string()))
            }
        }
    }
}
