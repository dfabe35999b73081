use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::TaskState;

/// Reference to a finalized repository document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub uid: String,
    pub path: String,
    #[serde(default)]
    pub title: String,
}

/// Lifecycle notification emitted by the scheduler.
///
/// Per-task ordering is strict: `Started`, zero or more
/// `ProgressUpdated`/`SpeedUpdated`, `Finished` once the transport is done,
/// then exactly one of `Ok`/`Error` after the finalize step. Events of
/// different tasks interleave arbitrarily. `BatchFinished` is emitted
/// exactly once per batch, after the last task settles.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Started {
        index: usize,
        file: String,
    },
    ProgressUpdated {
        index: usize,
        file: String,
        /// Fraction of the file's bytes sent, 0.0–1.0.
        fraction: f64,
    },
    SpeedUpdated {
        index: usize,
        file: String,
        bytes_per_sec: f64,
    },
    /// Raw transport completed; the finalize step may still fail.
    Finished {
        index: usize,
        file: String,
        elapsed: Duration,
    },
    Ok {
        index: usize,
        document: DocumentRef,
    },
    Error {
        index: usize,
        file: String,
        error: String,
    },
    BatchFinished {
        outcomes: Vec<TaskOutcome>,
    },
}

impl UploadEvent {
    /// The submission index of the task this event belongs to, if any.
    pub fn task_index(&self) -> Option<usize> {
        match self {
            UploadEvent::Started { index, .. }
            | UploadEvent::ProgressUpdated { index, .. }
            | UploadEvent::SpeedUpdated { index, .. }
            | UploadEvent::Finished { index, .. }
            | UploadEvent::Ok { index, .. }
            | UploadEvent::Error { index, .. } => Some(*index),
            UploadEvent::BatchFinished { .. } => None,
        }
    }
}

/// Terminal result of one task, reported in original submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub index: usize,
    pub file: String,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn success(index: usize, file: String, document: DocumentRef) -> Self {
        Self {
            index,
            file,
            state: TaskState::Success,
            document: Some(document),
            error: None,
        }
    }

    pub fn failure(index: usize, file: String, error: String) -> Self {
        Self {
            index,
            file,
            state: TaskState::Error,
            document: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == TaskState::Success
    }
}
