//! Session orchestration
//!
//! The [`SessionOrchestrator`] is the top-level state machine coordinating
//! wallet binding, contract loading, write submission, confirmation polling,
//! and resynchronization. It owns all session-scoped mutable state (active
//! account, contract gateway, proposal snapshot); the display layer only
//! consumes [`SessionView`] values and never mutates the core directly.
//!
//! # Example
//!
//! ```ignore
//! use conflux_gov_rs::{Config, HttpRpcClient, SessionOrchestrator};
//!
//! let config = Config::from_env();
//! let rpc = Arc::new(HttpRpcClient::new(&config.ledger.rpc_endpoint));
//! let session = SessionOrchestrator::new(config, rpc, wallet);
//!
//! session.connect().await?;
//! session.load_contract("cfxtest:...").await?;
//! session.create_proposal("Title", "Description").await?;
//! ```

use std::sync::Arc;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::contract::{governance_interface, ContractGateway, PendingInvocation};
use crate::error::{Error, Result};
use crate::rpc::LedgerRpc;
use crate::sync::ProposalSynchronizer;
use crate::tx::{CancelHandle, CancelToken, ConfirmationPoller, TransactionSubmitter};
use crate::types::{Proposal, Receipt};
use crate::utils::Address;
use crate::wallet::{IdentityBinder, WalletProvider};

/// Where the session currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No account bound, no contract loaded
    Disconnected,
    /// Account bound, no contract loaded
    Connected,
    /// Contract loaded, no write action in flight
    Idle,
    /// A write action is being signed and broadcast
    Submitting,
    /// Waiting for a receipt
    Polling,
    /// Rebuilding the proposal snapshot
    Syncing,
}

/// Outcome of the probing read performed while loading a contract
///
/// A failed probe is reported but does not invalidate the handle; write
/// operations may still be attempted against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Succeeded { count: u64 },
    Failed { cause: String },
}

/// Read-only snapshot of the session for the display layer
#[derive(Debug, Clone)]
pub struct SessionView {
    pub account: Option<Address>,
    /// Full proposal snapshot, ordered by id ascending
    pub proposals: Vec<Proposal>,
    pub phase: SessionPhase,
    /// True while a write action is in flight
    pub busy: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Session-scoped mutable state, written only by the orchestrator
///
/// The mutex is held only across synchronous sections, never across an
/// await, so readers observe either the old or the new value of the account
/// and contract handle.
struct SessionState {
    account: Option<Address>,
    contract: Option<ContractGateway>,
    proposals: Vec<Proposal>,
    phase: SessionPhase,
    /// Request token of the in-flight write action, if any
    in_flight: Option<Uuid>,
    /// Cancel handle of the in-flight confirmation poll, if any
    cancel: Option<CancelHandle>,
    last_synced_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            account: None,
            contract: None,
            proposals: Vec::new(),
            phase: SessionPhase::Disconnected,
            in_flight: None,
            cancel: None,
            last_synced_at: None,
        }
    }

    fn stable_phase(&self) -> SessionPhase {
        if self.contract.is_some() {
            SessionPhase::Idle
        } else if self.account.is_some() {
            SessionPhase::Connected
        } else {
            SessionPhase::Disconnected
        }
    }
}

/// Top-level coordinator for one governance session
pub struct SessionOrchestrator {
    config: Config,
    rpc: Arc<dyn LedgerRpc>,
    binder: IdentityBinder,
    submitter: TransactionSubmitter,
    poller: ConfirmationPoller,
    synchronizer: ProposalSynchronizer,
    state: Mutex<SessionState>,
}

impl SessionOrchestrator {
    /// Create a session over a ledger RPC and a wallet provider
    pub fn new(
        config: Config,
        rpc: Arc<dyn LedgerRpc>,
        wallet: Arc<dyn WalletProvider>,
    ) -> Self {
        let poller = ConfirmationPoller::new(rpc.clone(), config.polling.interval());
        Self {
            config,
            rpc,
            binder: IdentityBinder::new(wallet.clone()),
            submitter: TransactionSubmitter::new(wallet),
            poller,
            synchronizer: ProposalSynchronizer::new(),
            state: Mutex::new(SessionState::new()),
        }
    }

    /// Create a session with no wallet provider; connect always fails
    /// `WalletUnavailable` but reads still work
    pub fn read_only(config: Config, rpc: Arc<dyn LedgerRpc>) -> Self {
        struct NoWallet;

        #[async_trait::async_trait]
        impl WalletProvider for NoWallet {
            async fn enable(&self) -> Result<Vec<String>> {
                Err(Error::wallet_unavailable("read-only session"))
            }

            async fn send_transaction(
                &self,
                _tx: &crate::wallet::TransactionRequest,
            ) -> Result<crate::types::TxHash> {
                Err(Error::wallet_unavailable("read-only session"))
            }
        }

        let poller = ConfirmationPoller::new(rpc.clone(), config.polling.interval());
        Self {
            config,
            rpc,
            binder: IdentityBinder::unavailable(),
            submitter: TransactionSubmitter::new(Arc::new(NoWallet)),
            poller,
            synchronizer: ProposalSynchronizer::new(),
            state: Mutex::new(SessionState::new()),
        }
    }

    // ==========================================================================
    // Identity
    // ==========================================================================

    /// Connect the wallet and bind its first revealed account
    ///
    /// If a contract is already loaded, the proposal snapshot is rebuilt so
    /// `has_voted` reflects the new account.
    pub async fn connect(&self) -> Result<Address> {
        let account = self.binder.connect().await?;

        let contract_loaded = {
            let mut state = self.state.lock().unwrap();
            state.account = Some(account.clone());
            state.phase = state.stable_phase();
            state.contract.is_some()
        };

        if contract_loaded {
            self.resynchronize().await?;
        }
        Ok(account)
    }

    /// Drop the active account
    ///
    /// Vote flags are relative to the signer, so the snapshot is rebuilt
    /// (every `has_voted` reads false) when a contract is loaded.
    pub async fn disconnect(&self) -> Result<()> {
        let contract_loaded = {
            let mut state = self.state.lock().unwrap();
            state.account = None;
            state.phase = state.stable_phase();
            state.contract.is_some()
        };
        info!("Wallet disconnected");

        if contract_loaded {
            self.resynchronize().await?;
        }
        Ok(())
    }

    // ==========================================================================
    // Contract lifecycle
    // ==========================================================================

    /// Bind the governance interface to `address` and probe it
    ///
    /// The probe is a `getProposalCount` read. Probe failure is reported in
    /// the returned status but the handle is kept: the address may still
    /// accept write transactions. On a successful probe the first
    /// synchronization runs before returning.
    pub async fn load_contract(&self, address: &str) -> Result<ProbeStatus> {
        let gateway = ContractGateway::bind(governance_interface(), address)?;

        let probe = match gateway.get_proposal_count(&*self.rpc).await {
            Ok(count) => {
                info!(address = %gateway.address(), count, "Contract loaded");
                ProbeStatus::Succeeded { count }
            }
            Err(e) => {
                warn!(address = %gateway.address(), error = %e, "Contract probe failed; keeping handle");
                ProbeStatus::Failed {
                    cause: e.to_string(),
                }
            }
        };

        {
            let mut state = self.state.lock().unwrap();
            state.contract = Some(gateway);
            state.proposals.clear();
            state.last_synced_at = None;
            state.phase = state.stable_phase();
        }

        if matches!(probe, ProbeStatus::Succeeded { .. }) {
            self.resynchronize().await?;
        }
        Ok(probe)
    }

    /// Load the contract address supplied by configuration, if any
    pub async fn load_default_contract(&self) -> Result<Option<ProbeStatus>> {
        let address = self.config.ledger.default_contract_address.clone();
        match address {
            Some(address) => self.load_contract(&address).await.map(Some),
            None => Ok(None),
        }
    }

    // ==========================================================================
    // Write actions
    // ==========================================================================

    /// Submit a new proposal and wait for it to land on the ledger
    pub async fn create_proposal(&self, title: &str, description: &str) -> Result<Receipt> {
        if title.trim().is_empty() {
            return Err(Error::EmptyField("title"));
        }
        if description.trim().is_empty() {
            return Err(Error::EmptyField("description"));
        }

        let (gateway, sender) = self.write_preconditions()?;
        let invocation = gateway.create_proposal(title, description)?;
        self.execute_write(invocation, sender).await
    }

    /// Cast a vote on a proposal and wait for it to land on the ledger
    ///
    /// The snapshot checks are advisory: the ledger remains the final
    /// arbiter and may still reject a vote the local view permitted.
    pub async fn vote(&self, id: u64, approve: bool) -> Result<Receipt> {
        let (gateway, sender) = self.write_preconditions()?;

        {
            let state = self.state.lock().unwrap();
            let proposal = state
                .proposals
                .iter()
                .find(|p| p.id == id)
                .ok_or(Error::UnknownProposal(id))?;
            if !proposal.is_active {
                return Err(Error::ProposalInactive(id));
            }
            if proposal.has_voted {
                return Err(Error::AlreadyVoted(id));
            }
        }

        let invocation = gateway.vote(id, approve)?;
        self.execute_write(invocation, sender).await
    }

    /// Abandon the confirmation poll of the in-flight write action, if any
    pub fn cancel_pending(&self) {
        let state = self.state.lock().unwrap();
        if let Some(cancel) = &state.cancel {
            cancel.cancel();
        }
    }

    // ==========================================================================
    // Synchronization and view
    // ==========================================================================

    /// Rebuild the proposal snapshot from the ledger
    pub async fn refresh(&self) -> Result<()> {
        self.resynchronize().await
    }

    /// Current session snapshot for the display layer
    pub fn view(&self) -> SessionView {
        let state = self.state.lock().unwrap();
        SessionView {
            account: state.account.clone(),
            proposals: state.proposals.clone(),
            phase: state.phase,
            busy: state.in_flight.is_some(),
            last_synced_at: state.last_synced_at,
        }
    }

    /// The active account, if connected
    pub fn account(&self) -> Option<Address> {
        self.state.lock().unwrap().account.clone()
    }

    /// True while a write action is in flight
    pub fn is_busy(&self) -> bool {
        self.state.lock().unwrap().in_flight.is_some()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().unwrap().phase
    }

    // ==========================================================================
    // Internals
    // ==========================================================================

    /// Both an active account and a loaded contract are required before a
    /// write action may touch the ledger
    fn write_preconditions(&self) -> Result<(ContractGateway, Address)> {
        let state = self.state.lock().unwrap();
        let gateway = state.contract.clone().ok_or(Error::ContractNotLoaded)?;
        let sender = state.account.clone().ok_or(Error::NoSigner)?;
        Ok((gateway, sender))
    }

    /// Submit → poll → resynchronize, gated by the session's request token
    async fn execute_write(
        &self,
        invocation: PendingInvocation,
        sender: Address,
    ) -> Result<Receipt> {
        let (token, cancel_token) = {
            let mut state = self.state.lock().unwrap();
            if let Some(existing) = state.in_flight {
                return Err(Error::Busy(existing));
            }
            let token = Uuid::new_v4();
            let (handle, cancel_token) = CancelToken::new();
            state.in_flight = Some(token);
            state.cancel = Some(handle);
            state.phase = SessionPhase::Submitting;
            (token, cancel_token)
        };
        debug!(%token, operation = %invocation.operation, "Write action started");

        let result = self
            .run_write(&invocation, &sender, cancel_token)
            .await;

        {
            let mut state = self.state.lock().unwrap();
            state.in_flight = None;
            state.cancel = None;
            state.phase = state.stable_phase();
        }

        match &result {
            Ok(receipt) => {
                debug!(%token, tx = %receipt.transaction_hash, "Write action complete")
            }
            Err(e) => warn!(%token, error = %e, "Write action failed"),
        }
        result
    }

    async fn run_write(
        &self,
        invocation: &PendingInvocation,
        sender: &Address,
        cancel: CancelToken,
    ) -> Result<Receipt> {
        let hash = self.submitter.submit(invocation, Some(sender)).await?;

        self.set_phase(SessionPhase::Polling);
        let receipt = self
            .poller
            .await_confirmation_with(&hash, self.config.polling.confirm_timeout(), cancel)
            .await?;
        if !receipt.succeeded() {
            warn!(tx = %hash, status = receipt.outcome_status, "Transaction confirmed but execution failed");
        }

        self.resynchronize().await?;
        Ok(receipt)
    }

    /// Full-snapshot resynchronization
    ///
    /// Replaces the whole collection atomically from the caller's
    /// perspective; a failed pass leaves the previous snapshot intact.
    async fn resynchronize(&self) -> Result<()> {
        let (gateway, account) = {
            let mut state = self.state.lock().unwrap();
            let gateway = state.contract.clone().ok_or(Error::ContractNotLoaded)?;
            state.phase = SessionPhase::Syncing;
            (gateway, state.account.clone())
        };

        let result = self
            .synchronizer
            .refresh(&*self.rpc, &gateway, account.as_ref())
            .await;

        let mut state = self.state.lock().unwrap();
        match result {
            Ok(proposals) => {
                state.proposals = proposals;
                state.last_synced_at = Some(Utc::now());
                state.phase = state.stable_phase();
                Ok(())
            }
            Err(e) => {
                state.phase = state.stable_phase();
                Err(e)
            }
        }
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.state.lock().unwrap().phase = phase;
    }
}

impl std::fmt::Display for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        write!(
            f,
            "Session( network={}, phase={:?}, proposals={} )",
            self.config.ledger.network,
            state.phase,
            state.proposals.len()
        )
    }
}
