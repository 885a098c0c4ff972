use std::path::Path;
use std::sync::Arc;

use gym_core::model::Catalog;
use storage::repository::Storage;

use crate::Clock;
use crate::completion::{ChatCompletionClient, CompletionService};
use crate::context::SessionContext;
use crate::error::AppServicesError;
use crate::progress_store::ProgressStore;
use crate::shell::SessionShell;

/// Assembles storage, catalog and completion service into learner sessions.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    completion: Arc<dyn CompletionService>,
    progress_store: ProgressStore,
    clock: Clock,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the environment-configured
    /// completion client.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Catalog,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, catalog, clock))
    }

    /// Build services that keep progress in memory only.
    #[must_use]
    pub fn in_memory(catalog: Catalog, clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), catalog, clock)
    }

    fn from_storage(storage: &Storage, catalog: Catalog, clock: Clock) -> Self {
        let client = ChatCompletionClient::from_env();
        if !client.enabled() {
            tracing::warn!("GYM_AI_API_KEY is not set; coaching and dialogue are unavailable");
        }
        Self {
            catalog: Arc::new(catalog),
            completion: Arc::new(client),
            progress_store: ProgressStore::new(Arc::clone(&storage.kv), clock),
            clock,
        }
    }

    /// Replace the completion service.
    #[must_use]
    pub fn with_completion(mut self, completion: Arc<dyn CompletionService>) -> Self {
        self.completion = completion;
        self
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::CatalogFile` if the file cannot be read, or
    /// `Catalog` if it is not a valid catalog.
    pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, AppServicesError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| AppServicesError::CatalogFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Catalog::from_json_str(&raw)?)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress_store
    }

    /// Load the stored progress and open a session over it.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start_session(&self) -> SessionShell {
        let ctx = SessionContext::open(
            Arc::clone(&self.catalog),
            Arc::clone(&self.completion),
            &self.progress_store,
            self.clock,
        )
        .await;
        SessionShell::new(ctx)
    }
}
