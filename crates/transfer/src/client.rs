//! The capability contract a remote-transfer client provides to the
//! scheduler.
//!
//! Using a trait keeps the admission logic decoupled from transport and
//! testable with scripted mocks.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use docbatch_protocol::{DocumentRef, UploadTask};
use tokio::sync::mpsc::UnboundedSender;

use crate::TransferError;

/// Raw notifications emitted by a client while one file transfers.
///
/// Sent over the unbounded sender supplied to [`TransferClient::begin_upload`];
/// the scheduler lifts them into indexed lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferSignal {
    Started,
    /// Fraction of the file's bytes sent, 0.0–1.0.
    Progress(f64),
    /// Current transfer speed in bytes per second.
    Speed(f64),
    /// Raw transport done; carries the elapsed transfer time.
    Finished(Duration),
}

/// Names server-side staged bytes awaiting the finalize step.
///
/// Opaque to the scheduler: it only hands the handle back to the client
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHandle {
    pub batch_id: String,
    pub file_index: u32,
    /// Destination folder the finalize step commits into.
    pub destination: String,
}

/// A client able to move one file's bytes to the repository and commit
/// them as a named document.
///
/// The upload is two-phase by contract: [`begin_upload`] stages the raw
/// bytes, [`finalize`] makes them visible as a document. A transport
/// success without finalize leaves no visible document on the server.
///
/// [`begin_upload`]: TransferClient::begin_upload
/// [`finalize`]: TransferClient::finalize
pub trait TransferClient: Send + Sync {
    /// Transfers the file's bytes, emitting `Started`, `Progress`, `Speed`
    /// and `Finished` signals along the way.
    fn begin_upload<'a>(
        &'a self,
        task: &'a UploadTask,
        signals: UnboundedSender<TransferSignal>,
    ) -> Pin<Box<dyn Future<Output = Result<UploadHandle, TransferError>> + Send + 'a>>;

    /// Commits previously staged bytes to a document named `target_name`
    /// in the handle's destination folder.
    ///
    /// No collision handling happens client-side: a server-side naming
    /// conflict surfaces as [`TransferError::Finalize`] on this task alone.
    fn finalize<'a>(
        &'a self,
        handle: &'a UploadHandle,
        target_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<DocumentRef, TransferError>> + Send + 'a>>;
}
