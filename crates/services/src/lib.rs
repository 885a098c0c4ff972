#![forbid(unsafe_code)]

pub mod app_services;
pub mod coaching;
pub mod completion;
pub mod context;
pub mod dashboard;
pub mod dialogue;
pub mod error;
pub mod progress_store;
pub mod prompts;
pub mod recognition;
pub mod reply;
pub mod shell;

#[cfg(test)]
mod test_support;

pub use gym_core::Clock;

pub use app_services::AppServices;
pub use coaching::{CoachingExercise, CoachingState, MIN_RESPONSE_CHARS};
pub use completion::{ChatCompletionClient, CompletionConfig, CompletionService};
pub use context::SessionContext;
pub use dashboard::{
    Dashboard, ModuleOverview, PhaseOverview, PrincipleOverview, ReferenceSection,
    reference_library,
};
pub use dialogue::{Dialogue, DialogueState, TurnOutcome};
pub use error::{
    AppServicesError, CoachingError, CompletionError, DialogueError, RecognitionError,
    ReplyError, ShellError,
};
pub use progress_store::{PROGRESS_KEY, ProgressStore, ProgressWriter, SaveStatus};
pub use prompts::{Contract, Prompt};
pub use recognition::{RecognitionDrill, RecognitionReveal, RecognitionState};
pub use shell::{ActiveScenario, SessionShell};
