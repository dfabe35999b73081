//! Transfer boundary: the capability a remote-transfer client must provide,
//! plus sliding-window speed sampling.
//!
//! The scheduler drives any [`TransferClient`] implementation; the real
//! HTTP client lives in `docbatch-repo-client`, tests use mocks.

mod client;
mod progress;

pub use client::{TransferClient, TransferSignal, UploadHandle};
pub use progress::SpeedCalculator;

/// Errors produced while transferring one file.
///
/// Every error is local to its task: the scheduler records it in that
/// task's outcome and never lets it abort sibling uploads.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Network or connection failure during the raw upload.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected the commit step (naming conflict, permission).
    #[error("finalize rejected ({status}): {message}")]
    Finalize { status: u16, message: String },

    /// The local file became unreadable between selection and upload start.
    #[error("local file unreadable: {0}")]
    Validation(#[from] std::io::Error),

    /// The batch was cancelled before this task was admitted.
    #[error("cancelled before admission")]
    Cancelled,
}
