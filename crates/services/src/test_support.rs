//! Fixtures shared by the unit tests of this crate.

use std::sync::Arc;

use gym_core::time::fixed_clock;
use storage::Storage;

use crate::completion::CompletionService;
use crate::context::SessionContext;
use crate::error::CompletionError;
use crate::progress_store::ProgressStore;
use crate::prompts::{Contract, Prompt};

#[path = "../tests/common/fake.rs"]
mod fake;

pub use fake::{CATALOG, DEBRIEF, FakeCompletion, GRADE, NOTE, catalog, module};

pub async fn session_with(completion: FakeCompletion) -> SessionContext {
    let store = ProgressStore::new(Storage::in_memory().kv, fixed_clock());
    SessionContext::open(Arc::new(catalog()), Arc::new(completion), &store, fixed_clock()).await
}

pub async fn session() -> SessionContext {
    session_with(FakeCompletion::new()).await
}
