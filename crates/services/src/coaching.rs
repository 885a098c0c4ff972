use gym_core::model::{CoachingScenario, GradeReport, ModuleId, Phase, ScenarioId};

use crate::completion;
use crate::context::SessionContext;
use crate::error::CoachingError;
use crate::prompts;
use crate::reply::parse_grade;

/// Responses shorter than this (trimmed, in characters) are not sent for grading.
pub const MIN_RESPONSE_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoachingState {
    Composing,
    AwaitingGrade,
    Graded(GradeReport),
}

/// Phase 2 controller: one free-text response graded by the completion service.
#[derive(Debug)]
pub struct CoachingExercise {
    module: ModuleId,
    scenario: CoachingScenario,
    state: CoachingState,
}

impl CoachingExercise {
    /// # Errors
    ///
    /// Returns `CoachingError::Catalog` if the scenario is unknown.
    pub fn open(
        ctx: &SessionContext,
        module: &ModuleId,
        scenario: &ScenarioId,
    ) -> Result<Self, CoachingError> {
        let scenario = ctx.catalog().coaching(module, scenario)?.clone();
        Ok(Self {
            module: module.clone(),
            scenario,
            state: CoachingState::Composing,
        })
    }

    #[must_use]
    pub fn scenario(&self) -> &CoachingScenario {
        &self.scenario
    }

    #[must_use]
    pub fn state(&self) -> &CoachingState {
        &self.state
    }

    /// Whether `text` is long enough to be graded.
    #[must_use]
    pub fn accepts(text: &str) -> bool {
        text.trim().chars().count() >= MIN_RESPONSE_CHARS
    }

    /// Send the response for grading and record the result.
    ///
    /// Text under `MIN_RESPONSE_CHARS` is ignored and yields `Ok(None)` without
    /// a request. On failure the exercise returns to `Composing` with progress
    /// untouched so the same text can be resubmitted.
    ///
    /// # Errors
    ///
    /// Returns `CoachingError::AlreadyGraded` while a grade is shown,
    /// `Completion` when the service fails, or `Reply` when its answer cannot
    /// be read as a grade.
    pub async fn request_coaching(
        &mut self,
        ctx: &mut SessionContext,
        text: &str,
    ) -> Result<Option<GradeReport>, CoachingError> {
        if matches!(self.state, CoachingState::Graded(_)) {
            return Err(CoachingError::AlreadyGraded);
        }
        if !Self::accepts(text) {
            return Ok(None);
        }

        self.state = CoachingState::AwaitingGrade;
        let report = match self.grade(ctx, text).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(scenario = %self.scenario.id, error = %err, "grading failed");
                self.state = CoachingState::Composing;
                return Err(err);
            }
        };

        let mut next = (*ctx.progress()).clone();
        let newly_completed = next.record_rated(
            &self.module,
            Phase::Coaching,
            &self.scenario.id,
            report.rating,
            &report.principle_names(),
        );
        ctx.commit(next);
        tracing::info!(
            module = %self.module,
            scenario = %self.scenario.id,
            rating = report.rating,
            newly_completed,
            "coached response graded"
        );

        self.state = CoachingState::Graded(report.clone());
        Ok(Some(report))
    }

    async fn grade(&self, ctx: &SessionContext, text: &str) -> Result<GradeReport, CoachingError> {
        let definitions = ctx.catalog().principle_definitions(&self.module)?;
        let prompt = prompts::grade(&self.scenario, &definitions, text);
        let service = ctx.completion();
        let reply = completion::request(service.as_ref(), &prompt).await?;
        Ok(parse_grade(&reply)?)
    }

    /// Discard the shown grade and start a fresh response.
    pub fn try_again(&mut self) {
        self.state = CoachingState::Composing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::Contract;
    use crate::test_support::{FakeCompletion, GRADE, module, session_with};

    const RESPONSE: &str = "I have led this caucus for ten years and kept every promise.";

    fn scenario() -> ScenarioId {
        ScenarioId::new("m1-p2-s1")
    }

    #[tokio::test]
    async fn short_text_sends_nothing() {
        let fake = FakeCompletion::new();
        let mut ctx = session_with(fake.clone()).await;
        let mut exercise =
            CoachingExercise::open(&ctx, &module(), &scenario()).unwrap();

        let outcome = exercise
            .request_coaching(&mut ctx, "  too short      ")
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(fake.total_calls(), 0);
        assert_eq!(exercise.state(), &CoachingState::Composing);
    }

    #[tokio::test]
    async fn graded_response_updates_progress() {
        let fake = FakeCompletion::new().reply(Contract::Grade, GRADE);
        let mut ctx = session_with(fake).await;
        let mut exercise =
            CoachingExercise::open(&ctx, &module(), &scenario()).unwrap();

        let report = exercise
            .request_coaching(&mut ctx, RESPONSE)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.rating, 4);
        let progress = ctx.progress();
        assert!(progress.is_completed(&module(), Phase::Coaching, &scenario()));
        let stat = progress.principle_stat("Ethos").unwrap();
        assert_eq!(stat.avg_rating(), Some(4.0));
        assert!(matches!(
            exercise.request_coaching(&mut ctx, RESPONSE).await,
            Err(CoachingError::AlreadyGraded)
        ));

        exercise.try_again();
        assert_eq!(exercise.state(), &CoachingState::Composing);
    }

    #[tokio::test]
    async fn unreadable_grade_leaves_progress_alone() {
        let fake = FakeCompletion::new().reply(Contract::Grade, "I think it was quite good!");
        let mut ctx = session_with(fake).await;
        let before = ctx.progress();
        let mut exercise =
            CoachingExercise::open(&ctx, &module(), &scenario()).unwrap();

        let err = exercise
            .request_coaching(&mut ctx, RESPONSE)
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, CoachingError::Reply(_)));
        assert_eq!(exercise.state(), &CoachingState::Composing);
        assert_eq!(*ctx.progress(), *before);
    }
}
