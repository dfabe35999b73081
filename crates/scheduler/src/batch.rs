//! Batch driver: admission control, signal forwarding, settle-all.
//!
//! Admission is a counting semaphore of `budget` permits acquired in the
//! sequential driver loop, so tasks start in strict submission order and
//! at most `budget` are ever in flight. Each worker carries its permit
//! until it settles; success and failure both free the slot.

use std::sync::Arc;

use docbatch_protocol::{DocumentRef, TaskOutcome, TaskState, UploadEvent, UploadTask};
use docbatch_transfer::{TransferClient, TransferError, TransferSignal};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs batches of upload tasks against a fixed concurrency budget.
pub struct AdmissionScheduler {
    budget: usize,
}

/// Final per-task outcomes of one batch run, in submission order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

enum Slot {
    Running(JoinHandle<TaskOutcome>),
    Settled(TaskOutcome),
}

impl AdmissionScheduler {
    /// Creates a scheduler allowing at most `budget` concurrent transfers.
    ///
    /// # Panics
    ///
    /// Panics if `budget` is 0.
    pub fn new(budget: usize) -> Self {
        assert!(budget >= 1, "concurrency budget must be at least 1");
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Uploads every task, at most `budget` at a time, and returns once all
    /// of them have settled.
    ///
    /// Events go out on `events` tagged with each task's submission index;
    /// publishing never blocks. Individual task failures are captured in
    /// the outcomes and never abort the batch. `BatchFinished` is emitted
    /// exactly once, after the last task settles, carrying the same
    /// outcomes as the returned report.
    ///
    /// `cancel` is honored at admission time: not-yet-admitted tasks settle
    /// as errors without the client ever being invoked. In-flight transfers
    /// run to completion.
    pub async fn run_batch(
        &self,
        client: Arc<dyn TransferClient>,
        events: UnboundedSender<UploadEvent>,
        tasks: Vec<UploadTask>,
        cancel: CancellationToken,
    ) -> BatchReport {
        let total = tasks.len();
        info!(tasks = total, budget = self.budget, "starting batch upload");

        let semaphore = Arc::new(Semaphore::new(self.budget));
        let mut slots: Vec<(usize, String, Slot)> = Vec::with_capacity(total);

        for mut task in tasks {
            task.state = TaskState::Queued;
            let index = task.index;
            let file = task.file_name();

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    Some(permit.expect("semaphore is never closed"))
                }
            };

            let Some(permit) = permit else {
                task.state = TaskState::Error;
                let error = TransferError::Cancelled.to_string();
                debug!(index, file = %file, "task skipped by cancellation");
                let _ = events.send(UploadEvent::Error {
                    index,
                    file: file.clone(),
                    error: error.clone(),
                });
                slots.push((
                    index,
                    file.clone(),
                    Slot::Settled(TaskOutcome::failure(index, file, error)),
                ));
                continue;
            };

            let worker = tokio::spawn({
                let client = Arc::clone(&client);
                let events = events.clone();
                async move {
                    let _permit = permit; // slot frees when the task settles
                    run_one(client, events, task).await
                }
            });
            slots.push((index, file, Slot::Running(worker)));
        }

        // Settle-all: wait for every slot, a failed task never
        // short-circuits its siblings.
        let mut outcomes = Vec::with_capacity(total);
        for (index, file, slot) in slots {
            let outcome = match slot {
                Slot::Settled(outcome) => outcome,
                Slot::Running(worker) => match worker.await {
                    Ok(outcome) => outcome,
                    Err(join_error) => {
                        warn!(index, error = %join_error, "upload worker died");
                        TaskOutcome::failure(
                            index,
                            file,
                            format!("upload worker died: {join_error}"),
                        )
                    }
                },
            };
            outcomes.push(outcome);
        }

        let report = BatchReport { outcomes };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch finished"
        );
        let _ = events.send(UploadEvent::BatchFinished {
            outcomes: report.outcomes.clone(),
        });
        report
    }
}

/// Runs one admitted task to its terminal state.
async fn run_one(
    client: Arc<dyn TransferClient>,
    events: UnboundedSender<UploadEvent>,
    mut task: UploadTask,
) -> TaskOutcome {
    let index = task.index;
    let file = task.file_name();
    task.state = TaskState::Uploading;
    debug!(index, file = %file, "task admitted");

    match transfer(&*client, &events, &task, &file).await {
        Ok(document) => {
            task.state = TaskState::Success;
            info!(index, file = %file, uid = %document.uid, "upload finalized");
            let _ = events.send(UploadEvent::Ok {
                index,
                document: document.clone(),
            });
            TaskOutcome::success(index, file, document)
        }
        Err(error) => {
            task.state = TaskState::Error;
            warn!(index, file = %file, error = %error, "upload failed");
            let _ = events.send(UploadEvent::Error {
                index,
                file: file.clone(),
                error: error.to_string(),
            });
            TaskOutcome::failure(index, file, error.to_string())
        }
    }
}

/// Raw upload then finalize, forwarding transport signals as events.
async fn transfer(
    client: &dyn TransferClient,
    events: &UnboundedSender<UploadEvent>,
    task: &UploadTask,
    file: &str,
) -> Result<DocumentRef, TransferError> {
    // The file was stat'ed at selection time; it must still be readable.
    let metadata = tokio::fs::metadata(&task.path).await?;
    if !metadata.is_file() {
        return Err(TransferError::Validation(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a regular file: {}", task.path.display()),
        )));
    }

    let (sig_tx, mut sig_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut begin = client.begin_upload(task, sig_tx);

    let handle = loop {
        tokio::select! {
            result = &mut begin => break result?,
            Some(signal) = sig_rx.recv() => forward(events, task.index, file, signal),
        }
    };
    // Signals the transport emitted just before resolving.
    while let Ok(signal) = sig_rx.try_recv() {
        forward(events, task.index, file, signal);
    }

    client.finalize(&handle, file).await
}

fn forward(
    events: &UnboundedSender<UploadEvent>,
    index: usize,
    file: &str,
    signal: TransferSignal,
) {
    let event = match signal {
        TransferSignal::Started => UploadEvent::Started {
            index,
            file: file.to_string(),
        },
        TransferSignal::Progress(fraction) => UploadEvent::ProgressUpdated {
            index,
            file: file.to_string(),
            fraction,
        },
        TransferSignal::Speed(bytes_per_sec) => UploadEvent::SpeedUpdated {
            index,
            file: file.to_string(),
            bytes_per_sec,
        },
        TransferSignal::Finished(elapsed) => UploadEvent::Finished {
            index,
            file: file.to_string(),
            elapsed,
        },
    };
    let _ = events.send(event);
}
