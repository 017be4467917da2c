pub mod abi;
pub mod config;
pub mod contract;
pub mod error;
pub mod logging;
pub mod rpc;
pub mod session;
pub mod sync;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export configuration
pub use config::{Config, LedgerConfig, PollingConfig};

// Re-export logging module
pub use logging::{init_default_logging, init_logging, is_initialized, LogFormat, LoggingConfig};

// Re-export core data types
pub use types::{Proposal, Receipt, TxHash};

// Re-export the unified error type and result alias
pub use error::{Error, Result};

// Re-export the CIP-37 / hex address type
pub use utils::Address;

// Re-export the ABI codec surface
pub use abi::{ParamKind, Token};

// Re-export ledger RPC access
pub use rpc::{HttpRpcClient, LedgerRpc};

// Re-export wallet binding
pub use wallet::{IdentityBinder, TransactionRequest, WalletProvider};

// Re-export the typed contract gateway
pub use contract::{
    governance_interface, ContractGateway, FunctionDescriptor, InterfaceDescription,
    PendingInvocation, ProposalFields, StateMutability,
};

// Re-export the transaction lifecycle pieces
pub use tx::{CancelHandle, CancelToken, ConfirmationPoller, TransactionSubmitter};

// Re-export synchronization
pub use sync::ProposalSynchronizer;

// Re-export the high-level session API
pub use session::{ProbeStatus, SessionOrchestrator, SessionPhase, SessionView};
