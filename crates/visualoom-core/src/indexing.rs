//! Indexing controller: start a backend job and poll it to completion.
//!
//! A job moves `NotStarted -> Started -> Polling -> Done`, or into `Error`
//! when the start call fails, a status call fails, the backend reports the
//! job as failed, or the poll bound runs out.
//!
//! Polling runs on a spawned task owned through a [`PollHandle`]. The
//! controller holds at most one handle and cancels it before starting a new
//! job; dropping the controller cancels it too. Every state write from a
//! poller is conditional on the shared state still belonging to that
//! poller's epoch, so a response for a superseded job can never overwrite
//! the current job's progress.

use crate::api::Backend;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::model::IndexJob;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Started(IndexJob),
    Polling(IndexJob),
    Done(IndexJob),
    Error {
        job_id: Option<String>,
        message: String,
    },
}

impl JobState {
    pub fn job(&self) -> Option<&IndexJob> {
        match self {
            JobState::Started(job) | JobState::Polling(job) | JobState::Done(job) => Some(job),
            JobState::NotStarted | JobState::Error { .. } => None,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobState::Error { job_id, .. } => job_id.as_deref(),
            other => other.job().map(|j| j.job_id.as_str()),
        }
    }

    pub fn progress(&self) -> u8 {
        self.job().map(|j| j.progress).unwrap_or(0)
    }

    /// No further transitions will happen without a new job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done(_) | JobState::Error { .. })
    }
}

/// State tagged with the epoch of the job that produced it.
#[derive(Debug, Clone)]
struct Tracked {
    epoch: u64,
    state: JobState,
}

/// Write `next` only if the shared state still belongs to `epoch`.
/// Returns false when the write was dropped as stale.
fn apply_if_current(state: &watch::Sender<Tracked>, epoch: u64, next: JobState) -> bool {
    state.send_if_modified(|tracked| {
        if tracked.epoch != epoch {
            return false;
        }
        tracked.state = next;
        true
    })
}

/// Owned polling task. Cancelled by [`PollHandle::cancel`] or on drop.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Receiver side of the controller's job state.
#[derive(Debug, Clone)]
pub struct JobWatch {
    rx: watch::Receiver<Tracked>,
}

impl JobWatch {
    pub fn current(&self) -> JobState {
        self.rx.borrow().state.clone()
    }

    /// Wait for the next state change. `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<JobState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().state.clone())
    }
}

pub struct IndexingController<B> {
    backend: B,
    interval: Duration,
    max_polls: Option<u32>,
    state: Arc<watch::Sender<Tracked>>,
    epoch: u64,
    poller: Option<PollHandle>,
}

impl<B: Backend + Clone + 'static> IndexingController<B> {
    /// `max_polls` of `None` polls until the job ends.
    pub fn new(backend: B, interval: Duration, max_polls: Option<u32>) -> Self {
        let (tx, _rx) = watch::channel(Tracked {
            epoch: 0,
            state: JobState::NotStarted,
        });
        Self {
            backend,
            interval,
            max_polls,
            state: Arc::new(tx),
            epoch: 0,
            poller: None,
        }
    }

    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend, config.poll_interval(), config.poll_limit())
    }

    pub fn state(&self) -> JobState {
        self.state.borrow().state.clone()
    }

    pub fn subscribe(&self) -> JobWatch {
        JobWatch {
            rx: self.state.subscribe(),
        }
    }

    /// True while a poller task is alive.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Start indexing `folder_path` and begin polling the returned job.
    /// A job the backend already finished goes straight to `Done` unpolled.
    ///
    /// Any previous poller is cancelled first, whatever the outcome.
    pub async fn start_indexing(&mut self, folder_path: &str) -> Result<IndexJob> {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        self.epoch += 1;
        let epoch = self.epoch;
        self.state.send_replace(Tracked {
            epoch,
            state: JobState::NotStarted,
        });

        match self.backend.start_indexing(folder_path).await {
            Ok(job) if job.done => {
                info!("indexed {} synchronously", folder_path);
                apply_if_current(&self.state, epoch, JobState::Done(job.clone()));
                Ok(job)
            }
            Ok(job) => {
                info!("indexing {} as job {}", folder_path, job.job_id);
                apply_if_current(&self.state, epoch, JobState::Started(job.clone()));
                self.poller = Some(self.spawn_poller(epoch, job.job_id.clone()));
                Ok(job)
            }
            Err(e) => {
                warn!("failed to start indexing {}: {}", folder_path, e);
                apply_if_current(
                    &self.state,
                    epoch,
                    JobState::Error {
                        job_id: None,
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    /// Stop polling the current job. A job that had not finished ends in
    /// `Error` so observers are not left waiting.
    pub fn cancel(&mut self) {
        let Some(poller) = self.poller.take() else {
            return;
        };
        poller.cancel();
        let epoch = self.epoch;
        self.state.send_if_modified(|tracked| {
            if tracked.epoch != epoch || tracked.state.is_terminal() {
                return false;
            }
            tracked.state = JobState::Error {
                job_id: tracked.state.job_id().map(str::to_string),
                message: "polling cancelled".to_string(),
            };
            true
        });
    }

    /// Wait until the current job reaches a terminal state.
    ///
    /// Returns immediately when no job is running.
    pub async fn wait(&self) -> JobState {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(|tracked| {
                tracked.state.is_terminal() || tracked.state == JobState::NotStarted
            })
            .await
            .map(|tracked| tracked.state.clone());
        match result {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Index an explicit file set. No job id and no polling: the backend
    /// answers with the number of files it indexed.
    pub async fn index_files(&self, paths: &[String]) -> Result<u64> {
        if paths.is_empty() {
            return Err(ApiError::Validation("no files selected".to_string()));
        }
        let count = self.backend.index_files(paths).await?;
        info!("indexed {} of {} file(s)", count, paths.len());
        Ok(count)
    }

    fn spawn_poller(&self, epoch: u64, job_id: String) -> PollHandle {
        let backend = self.backend.clone();
        let state = Arc::clone(&self.state);
        let interval = self.interval;
        let max_polls = self.max_polls;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut polls: u32 = 0;

            loop {
                ticker.tick().await;
                if let Some(limit) = max_polls
                    && polls >= limit
                {
                    warn!("job {} still running after {} polls, giving up", job_id, limit);
                    apply_if_current(
                        &state,
                        epoch,
                        JobState::Error {
                            job_id: Some(job_id.clone()),
                            message: format!("gave up after {} status polls", limit),
                        },
                    );
                    break;
                }
                polls += 1;

                let next = match backend.get_index_status(&job_id).await {
                    Ok(status) => match status.error {
                        Some(message) => JobState::Error {
                            job_id: Some(job_id.clone()),
                            message,
                        },
                        None if status.job.done => JobState::Done(status.job),
                        None => JobState::Polling(status.job),
                    },
                    Err(e) => {
                        warn!("status poll for job {} failed: {}", job_id, e);
                        JobState::Error {
                            job_id: Some(job_id.clone()),
                            message: e.to_string(),
                        }
                    }
                };
                let terminal = next.is_terminal();
                if !apply_if_current(&state, epoch, next) {
                    debug!("job {} superseded, dropping status", job_id);
                    break;
                }
                if terminal {
                    debug!("job {} finished after {} polls", job_id, polls);
                    break;
                }
            }
        });

        PollHandle { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;
    use serde_json::json;

    const TICK: Duration = Duration::from_millis(2000);

    fn controller(fake: &FakeBackend, max_polls: Option<u32>) -> IndexingController<FakeBackend> {
        IndexingController::new(fake.clone(), TICK, max_polls)
    }

    #[test]
    fn stale_epoch_write_is_dropped() {
        let (tx, _rx) = watch::channel(Tracked {
            epoch: 2,
            state: JobState::Started(IndexJob::new("new")),
        });
        let mut stale = IndexJob::new("old");
        stale.progress = 90;
        assert!(!apply_if_current(&tx, 1, JobState::Polling(stale)));
        assert_eq!(tx.borrow().state, JobState::Started(IndexJob::new("new")));

        assert!(apply_if_current(&tx, 2, JobState::Done(IndexJob::new("new"))));
    }

    #[tokio::test(start_paused = true)]
    async fn start_moves_to_started() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["job-1"]);
        fake.push_status("job-1", json!({"progress": 0, "done": false}));
        let mut ctl = controller(&fake, None);
        assert_eq!(ctl.state(), JobState::NotStarted);

        let job = ctl.start_indexing("/photos").await.unwrap();
        assert_eq!(job.job_id, "job-1");
        assert_eq!(ctl.state(), JobState::Started(IndexJob::new("job-1")));
        assert_eq!(fake.started_folders(), vec!["/photos".to_string()]);
        assert!(ctl.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_once_done() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        fake.push_status("j", json!({"progress": 40, "done": false}));
        fake.push_status("j", json!({"progress": 100, "done": true}));
        let mut ctl = controller(&fake, None);
        let mut watch = ctl.subscribe();

        ctl.start_indexing("/photos").await.unwrap();
        let polled = watch.changed().await.unwrap();
        assert_eq!(polled, JobState::Started(IndexJob::new("j")));

        let state = ctl.wait().await;
        assert!(matches!(&state, JobState::Done(job) if job.progress == 100));
        assert_eq!(fake.status_calls("j"), 2);

        tokio::time::sleep(TICK * 10).await;
        assert_eq!(fake.status_calls("j"), 2);
        assert!(!ctl.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_updates_between_polls() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        fake.push_status("j", json!({"progress": 25, "done": false}));
        fake.push_status("j", json!({"progress": 75, "done": false}));
        let mut ctl = controller(&fake, None);
        ctl.start_indexing("/photos").await.unwrap();

        tokio::time::sleep(TICK + Duration::from_millis(100)).await;
        assert_eq!(ctl.state().progress(), 25);
        assert!(matches!(ctl.state(), JobState::Polling(_)));

        tokio::time::sleep(TICK).await;
        assert_eq!(ctl.state().progress(), 75);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_poll_cannot_overwrite_new_job() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["a", "b"]);
        let gate = fake.gate_status("a");
        fake.push_status("a", json!({"progress": 90, "done": false}));
        fake.push_status("b", json!({"progress": 10, "done": false}));
        let mut ctl = controller(&fake, None);

        ctl.start_indexing("/one").await.unwrap();
        tokio::time::sleep(TICK + Duration::from_millis(500)).await;
        assert_eq!(fake.status_calls("a"), 1);

        ctl.start_indexing("/two").await.unwrap();
        gate.notify_one();
        tokio::time::sleep(TICK + Duration::from_millis(500)).await;

        let state = ctl.state();
        assert_eq!(state.job_id(), Some("b"));
        assert_eq!(state.progress(), 10);
        assert_eq!(fake.status_calls("b"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unaborted_stale_poller_drops_its_status_and_exits() {
        let fake = FakeBackend::new();
        fake.push_status("a", json!({"progress": 90, "done": false}));
        let mut ctl = controller(&fake, None);
        ctl.epoch = 2;
        ctl.state.send_replace(Tracked {
            epoch: 2,
            state: JobState::Started(IndexJob::new("b")),
        });
        let watch = ctl.subscribe();

        // left over from epoch 1 and still running
        let stale = ctl.spawn_poller(1, "a".to_string());
        tokio::time::sleep(TICK + Duration::from_millis(500)).await;

        assert_eq!(fake.status_calls("a"), 1);
        assert_eq!(ctl.state(), JobState::Started(IndexJob::new("b")));
        assert!(!watch.rx.has_changed().unwrap());
        assert!(stale.is_finished());

        tokio::time::sleep(TICK * 3).await;
        assert_eq!(fake.status_calls("a"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn synchronous_index_is_done_without_polling() {
        let fake = FakeBackend::new();
        fake.queue_start_response(json!({"indexed": 3, "path": "/photos"}));
        let mut ctl = controller(&fake, None);

        let job = ctl.start_indexing("/photos").await.unwrap();
        assert!(job.done);
        assert_eq!(ctl.state(), JobState::Done(IndexJob::finished("/photos")));
        assert_eq!(ctl.state().progress(), 100);
        assert!(!ctl.is_polling());

        assert_eq!(ctl.wait().await, JobState::Done(IndexJob::finished("/photos")));
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(fake.total_status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_sets_error_without_job() {
        let fake = FakeBackend::new();
        let mut ctl = controller(&fake, None);

        assert!(ctl.start_indexing("/photos").await.is_err());
        let state = ctl.state();
        assert!(matches!(state, JobState::Error { job_id: None, .. }));
        assert!(!ctl.is_polling());
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(fake.total_status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_call_ends_in_error() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        let mut ctl = controller(&fake, None);
        ctl.start_indexing("/photos").await.unwrap();

        let state = ctl.wait().await;
        assert!(matches!(state, JobState::Error { job_id: Some(ref id), .. } if id == "j"));
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(fake.status_calls("j"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_reported_failure_ends_in_error() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        fake.push_status("j", json!({"status": "failed", "error": "disk full"}));
        let mut ctl = controller(&fake, None);
        ctl.start_indexing("/photos").await.unwrap();

        match ctl.wait().await {
            JobState::Error { message, .. } => assert_eq!(message, "disk full"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_bound_gives_up() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        fake.push_status("j", json!({"progress": 5, "done": false}));
        let mut ctl = controller(&fake, Some(3));
        ctl.start_indexing("/photos").await.unwrap();

        let state = ctl.wait().await;
        assert!(matches!(state, JobState::Error { .. }));
        assert_eq!(fake.status_calls("j"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_stops_polling() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        fake.push_status("j", json!({"progress": 5, "done": false}));
        let mut ctl = controller(&fake, None);
        ctl.start_indexing("/photos").await.unwrap();
        drop(ctl);

        tokio::time::sleep(TICK * 5).await;
        assert_eq!(fake.status_calls("j"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ends_in_error_and_stops() {
        let fake = FakeBackend::new();
        fake.queue_jobs(&["j"]);
        fake.push_status("j", json!({"progress": 5, "done": false}));
        let mut ctl = controller(&fake, None);
        ctl.start_indexing("/photos").await.unwrap();
        tokio::time::sleep(TICK + Duration::from_millis(100)).await;

        ctl.cancel();
        assert!(matches!(ctl.state(), JobState::Error { ref message, .. } if message == "polling cancelled"));
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(fake.status_calls("j"), 1);
    }

    #[tokio::test]
    async fn index_files_returns_count() {
        let fake = FakeBackend::new();
        fake.set_index_files(json!({"indexed": 2}));
        let ctl = controller(&fake, None);
        let files = vec!["/a/1.jpg".to_string(), "/a/2.jpg".to_string()];

        assert_eq!(ctl.index_files(&files).await.unwrap(), 2);
        assert_eq!(fake.indexed_file_batches(), vec![files]);
    }

    #[tokio::test]
    async fn index_files_rejects_empty_selection() {
        let fake = FakeBackend::new();
        let ctl = controller(&fake, None);
        let err = ctl.index_files(&[]).await.unwrap_err();
        assert!(err.is_validation());
        assert!(fake.indexed_file_batches().is_empty());
    }

    #[tokio::test]
    async fn wait_without_job_returns_immediately() {
        let fake = FakeBackend::new();
        let ctl = controller(&fake, None);
        assert_eq!(ctl.wait().await, JobState::NotStarted);
    }
}
