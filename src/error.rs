//! Error types for the governance engine

use thiserror::Error;

/// Result type alias using the engine's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the governance engine
///
/// Every failure carries a human-readable cause string and is surfaced to the
/// caller as-is; the engine never swallows an error or retries on its own,
/// apart from the fixed "no receipt yet" polling loop in the confirmation
/// poller.
#[derive(Error, Debug)]
pub enum Error {
    /// No wallet provider is configured for this session
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The wallet provider denied the connection request
    #[error("Wallet connection rejected: {0}")]
    UserRejected(String),

    /// Address is not one of the ledger's accepted syntactic forms
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A non-mutating contract call failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// A write action was attempted without an active signing account
    #[error("No active signer; connect a wallet first")]
    NoSigner,

    /// The signer declined to sign the transaction
    #[error("Submission rejected by signer: {0}")]
    SubmissionRejected(String),

    /// The node rejected the broadcast (malformed call, insufficient balance, ...)
    #[error("Broadcast error: {0}")]
    BroadcastError(String),

    /// A synchronization pass failed; no partial proposal snapshot was published
    #[error("Proposal sync failed: {0}")]
    SyncFailed(String),

    /// A write action was attempted before a contract was loaded
    #[error("No contract loaded; load a contract first")]
    ContractNotLoaded,

    /// Vote target is outside the last synchronized snapshot
    #[error("Proposal {0} not found in the current snapshot")]
    UnknownProposal(u64),

    /// Vote target is no longer accepting votes
    #[error("Proposal {0} is not active")]
    ProposalInactive(u64),

    /// The active account already voted on this proposal
    #[error("Already voted on proposal {0}")]
    AlreadyVoted(u64),

    /// A required text field was empty
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// Operation name not present in the bound interface description
    #[error("Operation '{0}' is not part of the contract interface")]
    UnknownOperation(String),

    /// Another write action is still in flight for this session
    #[error("Session busy: operation {0} is still in flight")]
    Busy(uuid::Uuid),

    /// Confirmation polling exceeded its deadline
    #[error("Timed out waiting for confirmation of {0}")]
    Timeout(String),

    /// Confirmation polling was abandoned by the caller
    #[error("Confirmation polling cancelled for {0}")]
    Cancelled(String),

    /// Contract call output could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn wallet_unavailable(msg: impl Into<String>) -> Self {
        Error::WalletUnavailable(msg.into())
    }

    pub fn user_rejected(msg: impl Into<String>) -> Self {
        Error::UserRejected(msg.into())
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Error::InvalidAddress(msg.into())
    }

    pub fn read_failed(msg: impl Into<String>) -> Self {
        Error::ReadFailed(msg.into())
    }

    pub fn broadcast(msg: impl Into<String>) -> Self {
        Error::BroadcastError(msg.into())
    }

    pub fn sync_failed(msg: impl Into<String>) -> Self {
        Error::SyncFailed(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ReadFailed(format!("RPC transport error: {}", e))
    }
}
