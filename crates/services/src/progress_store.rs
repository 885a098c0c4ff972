//! Loading and persisting the learner's `Progress`.
//!
//! Both directions fail soft. A snapshot that cannot be read yields fresh
//! progress, and a write that fails is logged and reported through
//! `SaveStatus` without ever blocking the caller.

use std::sync::Arc;

use gym_core::Clock;
use gym_core::model::Progress;
use storage::repository::KeyValueStore;
use tokio::sync::{mpsc, oneshot, watch};

/// Key the serialized snapshot is stored under.
pub const PROGRESS_KEY: &str = "persuasion-gym:progress";

/// Outcome of the most recent persistence attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saved,
    Failed,
}

#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self { kv, clock }
    }

    /// Load the stored snapshot, or fresh progress if there is none or it is unreadable.
    pub async fn load(&self) -> Progress {
        let raw = match self.kv.get(PROGRESS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Progress::new(self.clock.now()),
            Err(err) => {
                tracing::warn!(error = %err, "progress read failed; starting fresh");
                return Progress::new(self.clock.now());
            }
        };
        match serde_json::from_str(&raw) {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(error = %err, "stored progress is unreadable; starting fresh");
                Progress::new(self.clock.now())
            }
        }
    }

    /// Persist a snapshot. Failures are logged and reported, never raised.
    pub async fn save(&self, progress: &Progress) -> SaveStatus {
        let raw = match serde_json::to_string(progress) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "progress could not be serialized");
                return SaveStatus::Failed;
            }
        };
        match self.kv.set(PROGRESS_KEY, &raw).await {
            Ok(()) => SaveStatus::Saved,
            Err(err) => {
                tracing::warn!(error = %err, "progress write failed");
                SaveStatus::Failed
            }
        }
    }

    /// Start the background task that persists committed snapshots in order.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn_writer(&self) -> ProgressWriter {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriterCommand>();
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let store = self.clone();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriterCommand::Save(snapshot) => {
                        let status = store.save(&snapshot).await;
                        status_tx.send_replace(status);
                    }
                    WriterCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        ProgressWriter {
            tx,
            status: status_rx,
        }
    }
}

enum WriterCommand {
    Save(Arc<Progress>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background persistence task.
pub struct ProgressWriter {
    tx: mpsc::UnboundedSender<WriterCommand>,
    status: watch::Receiver<SaveStatus>,
}

impl ProgressWriter {
    /// Queue a snapshot for persistence and return immediately.
    pub fn submit(&self, snapshot: Arc<Progress>) {
        if self.tx.send(WriterCommand::Save(snapshot)).is_err() {
            tracing::warn!("progress writer stopped; snapshot kept in memory only");
        }
    }

    /// Wait until every snapshot submitted so far has been handled.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriterCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gym_core::model::{ModuleId, ScenarioId};
    use gym_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, StorageError};

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn sample() -> Progress {
        let mut progress = Progress::new(fixed_now());
        progress.record_recognition(
            &ModuleId::new("module-1"),
            &ScenarioId::new("m1-p1-s1"),
            "Ethos",
            true,
        );
        progress
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = ProgressStore::new(Arc::new(InMemoryRepository::new()), fixed_clock());
        assert_eq!(store.save(&sample()).await, SaveStatus::Saved);
        assert_eq!(store.load().await, sample());
    }

    #[tokio::test]
    async fn unreadable_snapshot_loads_fresh_progress() {
        let repo = InMemoryRepository::new();
        repo.set(PROGRESS_KEY, "{not json").await.unwrap();
        let store = ProgressStore::new(Arc::new(repo), fixed_clock());
        assert_eq!(store.load().await, Progress::new(fixed_now()));
    }

    #[tokio::test]
    async fn broken_backend_fails_soft() {
        let store = ProgressStore::new(Arc::new(BrokenStore), fixed_clock());
        assert_eq!(store.load().await, Progress::new(fixed_now()));
        assert_eq!(store.save(&sample()).await, SaveStatus::Failed);
    }

    #[tokio::test]
    async fn writer_persists_in_submission_order() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::new(Arc::new(repo.clone()), fixed_clock());
        let writer = store.spawn_writer();
        assert_eq!(writer.status(), SaveStatus::Idle);

        writer.submit(Arc::new(Progress::new(fixed_now())));
        writer.submit(Arc::new(sample()));
        writer.flush().await;

        assert_eq!(writer.status(), SaveStatus::Saved);
        assert_eq!(store.load().await, sample());
    }

    #[tokio::test]
    async fn writer_reports_failures() {
        let store = ProgressStore::new(Arc::new(BrokenStore), fixed_clock());
        let writer = store.spawn_writer();
        writer.submit(Arc::new(sample()));
        writer.flush().await;
        assert_eq!(writer.status(), SaveStatus::Failed);
    }
}
