#![allow(dead_code)]

use std::sync::Arc;

use gym_core::time::fixed_clock;
use services::{AppServices, CompletionError, CompletionService, Prompt, SessionShell};

pub use services::Contract;

mod fake;

pub use fake::{CATALOG, DEBRIEF, FakeCompletion, GRADE, NOTE, catalog, module};

pub fn app_services(fake: &FakeCompletion) -> AppServices {
    AppServices::in_memory(catalog(), fixed_clock()).with_completion(Arc::new(fake.clone()))
}

pub async fn start_shell(fake: &FakeCompletion) -> SessionShell {
    app_services(fake).start_session().await
}
