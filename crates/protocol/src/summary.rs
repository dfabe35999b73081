use std::collections::HashSet;

use crate::events::UploadEvent;

/// Running batch statistics, folded from the event stream.
///
/// Pure state: feed every [`UploadEvent`] through [`BatchSummary::apply`]
/// and read the counters. Progress and speed updates do not change counts.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub selected: usize,
    pub waiting: usize,
    pub uploading: usize,
    pub success: usize,
    pub problems: Vec<String>,
    started: HashSet<usize>,
    finished: bool,
}

impl BatchSummary {
    /// A summary for a batch of `selected` tasks, all initially waiting.
    pub fn new(selected: usize) -> Self {
        Self {
            selected,
            waiting: selected,
            ..Default::default()
        }
    }

    /// Folds one event into the counters.
    pub fn apply(&mut self, event: &UploadEvent) {
        match event {
            UploadEvent::Started { index, .. } => {
                if self.started.insert(*index) {
                    self.waiting = self.waiting.saturating_sub(1);
                    self.uploading += 1;
                }
            }
            UploadEvent::Ok { index, .. } => {
                self.settle(*index);
                self.success += 1;
            }
            UploadEvent::Error { index, file, error } => {
                self.settle(*index);
                self.problems.push(format!("{file}: {error}"));
            }
            UploadEvent::BatchFinished { .. } => {
                self.finished = true;
            }
            UploadEvent::ProgressUpdated { .. }
            | UploadEvent::SpeedUpdated { .. }
            | UploadEvent::Finished { .. } => {}
        }
    }

    /// Whether the aggregate completion signal has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    // A task that never started (cancelled before admission) settles out of
    // the waiting count instead of the uploading count.
    fn settle(&mut self, index: usize) {
        if self.started.remove(&index) {
            self.uploading = self.uploading.saturating_sub(1);
        } else {
            self.waiting = self.waiting.saturating_sub(1);
        }
    }
}
