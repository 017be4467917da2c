//! Proposal synchronization
//!
//! Rebuilds the complete ordered proposal collection from the ledger. Every
//! pass is a full snapshot: the counter is read first, then each proposal's
//! fields in `[0, count)`, then the active account's vote flags. A pass
//! either produces the whole collection or fails with `SyncFailed`; no
//! partial collection is ever returned.

use tracing::{debug, info};

use crate::contract::ContractGateway;
use crate::error::{Error, Result};
use crate::rpc::LedgerRpc;
use crate::types::Proposal;
use crate::utils::Address;

/// Reconstructs the proposal list (and per-account vote flags) from
/// gateway reads
#[derive(Debug, Default)]
pub struct ProposalSynchronizer;

impl ProposalSynchronizer {
    pub fn new() -> Self {
        Self
    }

    /// Fetch a full proposal snapshot, ordered by id ascending
    ///
    /// When `account` is absent every `has_voted` flag is false, since vote
    /// status is relative to the signer. The count and the per-id reads are
    /// a best-effort consistent snapshot; a proposal created between them
    /// surfaces on the next pass.
    pub async fn refresh(
        &self,
        rpc: &dyn LedgerRpc,
        gateway: &ContractGateway,
        account: Option<&Address>,
    ) -> Result<Vec<Proposal>> {
        let count = gateway
            .get_proposal_count(rpc)
            .await
            .map_err(|e| Error::sync_failed(format!("proposal count read failed: {}", e)))?;
        debug!(count, "Synchronizing proposals");

        let mut proposals = Vec::with_capacity(count as usize);
        for id in 0..count {
            let fields = gateway
                .get_proposal(rpc, id)
                .await
                .map_err(|e| Error::sync_failed(format!("proposal {} read failed: {}", id, e)))?;
            proposals.push(Proposal {
                id,
                title: fields.title,
                description: fields.description,
                yes_votes: fields.yes_votes,
                no_votes: fields.no_votes,
                is_active: fields.is_active,
                has_voted: false,
            });
        }

        // Vote flags are fetched concurrently; the collection itself stays
        // ordered by id because results are applied positionally.
        if let Some(account) = account {
            let lookups = (0..count).map(|id| gateway.has_voted(rpc, id, account));
            let flags = futures::future::try_join_all(lookups)
                .await
                .map_err(|e| Error::sync_failed(format!("vote flag read failed: {}", e)))?;
            for (proposal, voted) in proposals.iter_mut().zip(flags) {
                proposal.has_voted = voted;
            }
        }

        info!(count = proposals.len(), "Proposal snapshot complete");
        Ok(proposals)
    }
}
