mod catalog;
mod conversation;
pub mod feedback;
mod ids;
mod phase;
mod progress;

pub use catalog::{
    AnswerOption, Catalog, CatalogError, Character, CoachingScenario, DialogueScenario,
    ModuleInfo, ModuleScenarios, PrincipleReference, PrincipleSummary, RecognitionScenario,
    Spotlight,
};
pub use conversation::{ConversationState, Speaker, Turn};
pub use feedback::{
    CoachingNote, Debrief, DetectedPrinciple, FeedbackError, GradeReport, GrowthOpportunity,
};
pub use ids::{ModuleId, ScenarioId};
pub use phase::{Phase, PhaseError};
pub use progress::{
    ModuleProgress, PhaseProgress, PrincipleStat, Progress, ProgressError, ScenarioScore,
};
