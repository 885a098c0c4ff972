//! Shared error types for the services crate.

use thiserror::Error;

use gym_core::model::{CatalogError, FeedbackError, ModuleId, Phase};
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `CompletionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("completion service is not configured")]
    Disabled,
    #[error("completion service returned an empty response")]
    EmptyResponse,
    #[error("completion request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A reply that could not be read as the expected structured record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReplyError {
    #[error("reply contains no JSON object")]
    NoJson,
    #[error("reply does not match the expected schema: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] FeedbackError),
}

/// Errors emitted by the recognition drill.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecognitionError {
    #[error("no option selected")]
    NoSelection,
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("answer already revealed")]
    AlreadyRevealed,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors emitted by the coached-response exercise.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoachingError {
    #[error("a grade is already shown; try again to write a new response")]
    AlreadyGraded,
    #[error("coaching unavailable right now: {0}")]
    Completion(#[from] CompletionError),
    #[error("coaching reply could not be read: {0}")]
    Reply(#[from] ReplyError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl CoachingError {
    /// Whether resubmitting the same text may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Completion(_) | Self::Reply(_))
    }
}

/// Errors emitted by the live dialogue.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DialogueError {
    #[error("turn text is empty")]
    EmptyTurn,
    #[error("conversation has reached its exchange limit")]
    ConversationOver,
    #[error("conversation is still in progress")]
    InProgress,
    #[error("response unavailable: {0}")]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl DialogueError {
    /// Whether resubmitting the same turn may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Completion(_))
    }
}

/// Errors emitted by the session shell.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShellError {
    #[error("{phase} of {module} is locked ({remaining} more completions needed)")]
    Locked {
        module: ModuleId,
        phase: Phase,
        remaining: usize,
    },
    #[error("no {0} scenario is open")]
    NotActive(Phase),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error(transparent)]
    Coaching(#[from] CoachingError),
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("cannot read catalog {path}: {source}")]
    CatalogFile {
        path: String,
        source: std::io::Error,
    },
}
