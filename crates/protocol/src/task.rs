use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "selected")]
    Selected,
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
}

impl TaskState {
    /// Returns `true` once the task can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Error)
    }

    /// Returns `true` if `next` is a legal successor of `self`.
    ///
    /// Selected → Queued on submission, Queued → Uploading on admission,
    /// Uploading → Success/Error on settle. Anything else is a bug in the
    /// scheduler, which exclusively owns state mutation.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Selected, TaskState::Queued)
                | (TaskState::Queued, TaskState::Uploading)
                | (TaskState::Queued, TaskState::Error)
                | (TaskState::Uploading, TaskState::Success)
                | (TaskState::Uploading, TaskState::Error)
        )
    }
}

/// One local file plus its destination, the unit the scheduler admits.
///
/// `index` is the position in the original submission order and tags every
/// event for this task, so observers can correlate rows regardless of
/// completion order.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub index: usize,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
    /// Repository folder the finalized document lands in.
    pub destination: String,
    pub state: TaskState,
}

impl UploadTask {
    /// Builds a task from a local path, capturing size and mtime at
    /// selection time.
    pub fn from_path(
        index: usize,
        path: impl Into<PathBuf>,
        destination: impl Into<String>,
    ) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        Ok(Self {
            index,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok(),
            path,
            destination: destination.into(),
            state: TaskState::Selected,
        })
    }

    /// The file's base name, used as the document name at finalize time.
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::Error.is_terminal());
        assert!(!TaskState::Selected.is_terminal());
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Uploading.is_terminal());
    }

    #[test]
    fn legal_transitions() {
        assert!(TaskState::Selected.can_transition_to(TaskState::Queued));
        assert!(TaskState::Queued.can_transition_to(TaskState::Uploading));
        assert!(TaskState::Uploading.can_transition_to(TaskState::Success));
        assert!(TaskState::Uploading.can_transition_to(TaskState::Error));
        // Cancelled before admission settles straight from Queued.
        assert!(TaskState::Queued.can_transition_to(TaskState::Error));
    }

    #[test]
    fn illegal_transitions() {
        assert!(!TaskState::Selected.can_transition_to(TaskState::Uploading));
        assert!(!TaskState::Success.can_transition_to(TaskState::Uploading));
        assert!(!TaskState::Error.can_transition_to(TaskState::Success));
        assert!(!TaskState::Uploading.can_transition_to(TaskState::Queued));
    }

    #[test]
    fn state_serde_names() {
        assert_eq!(
            serde_json::to_string(&TaskState::Uploading).unwrap(),
            "\"uploading\""
        );
        let s: TaskState = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(s, TaskState::Error);
    }

    #[test]
    fn from_path_captures_metadata() {
        let dir = std::env::temp_dir().join("docbatch-task-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("report.pdf");
        std::fs::write(&file, b"PDFDATA").unwrap();

        let task = UploadTask::from_path(3, &file, "/asset-library/inbox").unwrap();
        assert_eq!(task.index, 3);
        assert_eq!(task.size_bytes, 7);
        assert_eq!(task.state, TaskState::Selected);
        assert_eq!(task.file_name(), "report.pdf");
        assert!(task.modified.is_some());
    }

    #[test]
    fn from_path_rejects_missing_file() {
        let err = UploadTask::from_path(0, "/nonexistent/nowhere.bin", "/dest");
        assert!(err.is_err());
    }

    #[test]
    fn from_path_rejects_directory() {
        let err = UploadTask::from_path(0, std::env::temp_dir(), "/dest");
        assert!(err.is_err());
    }
}
