use std::fmt;
use std::sync::Arc;

use gym_core::Clock;
use gym_core::model::{Catalog, Progress};

use crate::completion::CompletionService;
use crate::progress_store::{ProgressStore, ProgressWriter, SaveStatus};

/// Everything a controller needs for one learner session.
///
/// Holds the current `Progress` as an immutable snapshot. Controllers build
/// the next snapshot from a clone and hand it to `commit`, which swaps it in
/// and queues it for persistence without waiting for the write.
pub struct SessionContext {
    catalog: Arc<Catalog>,
    completion: Arc<dyn CompletionService>,
    clock: Clock,
    progress: Arc<Progress>,
    writer: ProgressWriter,
}

impl SessionContext {
    /// Load progress from `store` and start its background writer.
    pub async fn open(
        catalog: Arc<Catalog>,
        completion: Arc<dyn CompletionService>,
        store: &ProgressStore,
        clock: Clock,
    ) -> Self {
        let progress = store.load().await;
        Self::with_progress(catalog, completion, store, progress, clock)
    }

    /// Build a context around an already loaded snapshot.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_progress(
        catalog: Arc<Catalog>,
        completion: Arc<dyn CompletionService>,
        store: &ProgressStore,
        progress: Progress,
        clock: Clock,
    ) -> Self {
        Self {
            catalog,
            completion,
            clock,
            progress: Arc::new(progress),
            writer: store.spawn_writer(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    pub(crate) fn completion(&self) -> Arc<dyn CompletionService> {
        Arc::clone(&self.completion)
    }

    /// Replace the snapshot with `next` and queue it for persistence.
    pub(crate) fn commit(&mut self, mut next: Progress) -> Arc<Progress> {
        next.touch(self.clock.now());
        self.progress = Arc::new(next);
        self.writer.submit(Arc::clone(&self.progress));
        Arc::clone(&self.progress)
    }

    /// Wait for queued snapshots to reach the store.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.writer.status()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("clock", &self.clock)
            .field("last_activity", &self.progress.last_activity())
            .field("save_status", &self.save_status())
            .finish_non_exhaustive()
    }
}
