//! Transaction lifecycle: submission and confirmation polling

pub mod poller;
pub mod submitter;

pub use poller::{CancelHandle, CancelToken, ConfirmationPoller};
pub use submitter::TransactionSubmitter;
