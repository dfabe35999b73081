//! The repository client: staging upload, finalize, probe and browsing.
//!
//! Async HTTP via `reqwest` with token-header authentication. The upload is
//! two-phase: file bytes stream into a server-side staging batch, then an
//! automation call commits them as a named document in the destination
//! folder.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docbatch_protocol::{DocumentRef, UploadTask};
use docbatch_transfer::{
    SpeedCalculator, TransferClient, TransferError, TransferSignal, UploadHandle,
};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::token::auth_token_link;
use crate::types::{BatchCreated, ChildrenResponse, RepoDocument};

/// Authentication header the repository expects.
const TOKEN_HEADER: &str = "X-Authentication-Token";

/// Read size for streaming upload bodies.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Minimum interval between progress notifications per file.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Errors from the repository client's browsing and probe surface.
///
/// Transfer-path errors use [`TransferError`] instead, per the capability
/// contract.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid authentication token")]
    InvalidToken,
}

/// Async client for one repository server.
pub struct RepoClient {
    http: reqwest::Client,
    base_url: String,
    authenticated: bool,
}

impl RepoClient {
    /// Creates a client for `server_url` authenticating with `token`.
    ///
    /// An empty token builds an unauthenticated client: the probe reports
    /// not-connected and the caller should surface the token link.
    pub fn new(server_url: &str, token: &str) -> Result<Self, RepoError> {
        let mut headers = HeaderMap::new();
        if !token.is_empty() {
            headers.insert(
                TOKEN_HEADER,
                HeaderValue::from_str(token).map_err(|_| RepoError::InvalidToken)?,
            );
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: server_url.trim_end_matches('/').to_string(),
            authenticated: !token.is_empty(),
        })
    }

    /// Connectivity probe. `true` when the server answers an authenticated
    /// request; never an error.
    pub async fn check_status(&self) -> bool {
        if !self.authenticated {
            return false;
        }
        self.get_json::<serde_json::Value>("/api/v1/user/current")
            .await
            .is_ok()
    }

    /// Lists the children of a repository path.
    pub async fn list_children(&self, path: &str) -> Result<Vec<RepoDocument>, RepoError> {
        let resp: ChildrenResponse = self.get_json(&children_endpoint(path)).await?;
        Ok(resp.entries)
    }

    /// Folderish children of `prefix`, usable as upload destinations.
    pub async fn writable_folders(&self, prefix: &str) -> Result<Vec<String>, RepoError> {
        let children = self.list_children(prefix).await?;
        Ok(children
            .into_iter()
            .filter(RepoDocument::is_folderish)
            .map(|d| d.path)
            .collect())
    }

    /// Absolute URL of the server's token-issuing flow.
    pub fn token_link(&self, application_name: &str) -> String {
        format!("{}/{}", self.base_url, auth_token_link(application_name))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RepoError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RepoError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<T>().await?)
    }

    /// Creates a server-side staging batch for one upload.
    async fn create_staging_batch(&self) -> Result<String, TransferError> {
        let url = format!("{}/api/v1/upload/", self.base_url);
        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransferError::Transport(format!(
                "staging batch refused with status {}",
                status.as_u16()
            )));
        }
        let created: BatchCreated = resp
            .json()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;
        debug!(batch_id = %created.batch_id, "staging batch created");
        Ok(created.batch_id)
    }

    /// Streams the file's bytes into the staging batch, emitting progress
    /// and speed signals along the way.
    async fn stream_file(
        &self,
        batch_id: &str,
        task: &UploadTask,
        signals: UnboundedSender<TransferSignal>,
    ) -> Result<(), TransferError> {
        let file = tokio::fs::File::open(&task.path).await?;
        let mut gate = ProgressGate::new(task.size_bytes);
        let speed = Arc::new(SpeedCalculator::new(None));

        let counted = ReaderStream::with_capacity(file, UPLOAD_CHUNK_SIZE).inspect({
            let speed = Arc::clone(&speed);
            move |chunk| {
                if let Ok(bytes) = chunk {
                    speed.add_sample(bytes.len() as u64);
                    if let Some(fraction) = gate.advance(bytes.len() as u64) {
                        let _ = signals.send(TransferSignal::Progress(fraction));
                        let _ = signals.send(TransferSignal::Speed(speed.bytes_per_second()));
                    }
                }
            }
        });

        let url = format!("{}/api/v1/upload/{}/0", self.base_url, batch_id);
        let resp = self
            .http
            .post(&url)
            .header("X-File-Name", task.file_name())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(counted))
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TransferError::Transport(format!(
                "upload refused ({}): {message}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

impl TransferClient for RepoClient {
    fn begin_upload<'a>(
        &'a self,
        task: &'a UploadTask,
        signals: UnboundedSender<TransferSignal>,
    ) -> Pin<Box<dyn Future<Output = Result<UploadHandle, TransferError>> + Send + 'a>> {
        Box::pin(async move {
            let batch_id = self.create_staging_batch().await?;
            let started = Instant::now();
            let _ = signals.send(TransferSignal::Started);

            self.stream_file(&batch_id, task, signals.clone()).await?;

            let elapsed = started.elapsed();
            debug!(
                file = %task.file_name(),
                bytes = task.size_bytes,
                ?elapsed,
                "raw upload complete"
            );
            let _ = signals.send(TransferSignal::Finished(elapsed));

            Ok(UploadHandle {
                batch_id,
                file_index: 0,
                destination: task.destination.clone(),
            })
        })
    }

    fn finalize<'a>(
        &'a self,
        handle: &'a UploadHandle,
        target_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<DocumentRef, TransferError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/api/v1/automation/FileManager.Import", self.base_url);
            let resp = self
                .http
                .post(&url)
                .json(&import_request_body(handle, target_name))
                .send()
                .await
                .map_err(|e| TransferError::Transport(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(TransferError::Finalize {
                    status: status.as_u16(),
                    message,
                });
            }

            let document: DocumentRef = resp
                .json()
                .await
                .map_err(|e| TransferError::Transport(e.to_string()))?;
            debug!(uid = %document.uid, name = target_name, "document imported");
            Ok(document)
        })
    }
}

/// Body of the finalize automation call.
///
/// The uploaded file's base name becomes the document name untouched; a
/// server-side naming conflict surfaces as a finalize error.
fn import_request_body(handle: &UploadHandle, target_name: &str) -> serde_json::Value {
    serde_json::json!({
        "input": format!("upload:{}:{}", handle.batch_id, handle.file_index),
        "context": { "currentDocument": handle.destination },
        "params": { "path": target_name },
    })
}

/// Endpoint of a path's `@children` listing, trailing slash normalized.
fn children_endpoint(path: &str) -> String {
    format!("/api/v1/path{}/@children", path.trim_end_matches('/'))
}

/// Decides when streamed bytes warrant a progress notification.
///
/// Emits on the first chunk, at most every [`PROGRESS_INTERVAL`] after
/// that, and always at completion.
struct ProgressGate {
    total: u64,
    sent: u64,
    last_emit: Option<Instant>,
}

impl ProgressGate {
    fn new(total: u64) -> Self {
        Self {
            total,
            sent: 0,
            last_emit: None,
        }
    }

    fn advance(&mut self, bytes: u64) -> Option<f64> {
        self.sent += bytes;
        let complete = self.sent >= self.total;
        let due = match self.last_emit {
            None => true,
            Some(at) => at.elapsed() >= PROGRESS_INTERVAL,
        };
        if !complete && !due {
            return None;
        }
        self.last_emit = Some(Instant::now());
        if self.total == 0 {
            return Some(1.0);
        }
        Some((self.sent as f64 / self.total as f64).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_endpoint_strips_trailing_slash() {
        assert_eq!(
            children_endpoint("/asset-library/inbox/"),
            "/api/v1/path/asset-library/inbox/@children"
        );
        assert_eq!(
            children_endpoint("/asset-library/inbox"),
            "/api/v1/path/asset-library/inbox/@children"
        );
    }

    #[test]
    fn import_body_shape() {
        let handle = UploadHandle {
            batch_id: "b-3".into(),
            file_index: 0,
            destination: "/asset-library/inbox".into(),
        };
        let body = import_request_body(&handle, "report.pdf");
        assert_eq!(body["input"], "upload:b-3:0");
        assert_eq!(body["context"]["currentDocument"], "/asset-library/inbox");
        assert_eq!(body["params"]["path"], "report.pdf");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = RepoClient::new("http://localhost:8080/repo/", "tok").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/repo");
    }

    #[test]
    fn empty_token_is_unauthenticated() {
        let client = RepoClient::new("http://localhost:8080/repo", "").unwrap();
        assert!(!client.authenticated);
    }

    #[test]
    fn control_characters_in_token_are_rejected() {
        assert!(matches!(
            RepoClient::new("http://localhost:8080/repo", "bad\ntoken"),
            Err(RepoError::InvalidToken)
        ));
    }

    #[test]
    fn token_link_joins_base_url() {
        let client = RepoClient::new("http://localhost:8080/repo", "tok").unwrap();
        let link = client.token_link("docbatch");
        assert!(link.starts_with("http://localhost:8080/repo/authentication/token?"));
    }

    #[tokio::test]
    async fn unauthenticated_probe_is_false_without_network() {
        let client = RepoClient::new("http://localhost:1/repo", "").unwrap();
        assert!(!client.check_status().await);
    }

    #[test]
    fn progress_gate_emits_first_and_completion() {
        let mut gate = ProgressGate::new(100);
        assert_eq!(gate.advance(10), Some(0.1));
        // Within the throttle interval, mid-file chunks stay quiet.
        assert_eq!(gate.advance(10), None);
        assert_eq!(gate.advance(80), Some(1.0));
    }

    #[test]
    fn progress_gate_caps_fraction_at_one() {
        let mut gate = ProgressGate::new(50);
        assert_eq!(gate.advance(80), Some(1.0));
    }

    #[test]
    fn progress_gate_empty_file() {
        let mut gate = ProgressGate::new(0);
        assert_eq!(gate.advance(0), Some(1.0));
    }
}
