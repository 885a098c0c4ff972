use gym_core::model::{
    AnswerOption, CatalogError, ModuleId, RecognitionScenario, ScenarioId, Spotlight,
};

use crate::context::SessionContext;
use crate::error::RecognitionError;

/// What the learner sees once an answer is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionReveal {
    pub selected: String,
    pub is_correct: bool,
    pub correct_option: AnswerOption,
    pub explanation: String,
    pub spotlight: Option<Spotlight>,
    /// `false` on replays of an already completed scenario.
    pub newly_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionState {
    Unanswered,
    Answered { option: String },
    Revealed(RecognitionReveal),
}

/// Phase 1 controller: one multiple-choice scenario at a time, no service calls.
#[derive(Debug)]
pub struct RecognitionDrill {
    module: ModuleId,
    scenario: RecognitionScenario,
    state: RecognitionState,
}

impl RecognitionDrill {
    /// # Errors
    ///
    /// Returns `RecognitionError::Catalog` if the scenario is unknown.
    pub fn open(
        ctx: &SessionContext,
        module: &ModuleId,
        scenario: &ScenarioId,
    ) -> Result<Self, RecognitionError> {
        let scenario = ctx.catalog().recognition(module, scenario)?.clone();
        Ok(Self {
            module: module.clone(),
            scenario,
            state: RecognitionState::Unanswered,
        })
    }

    #[must_use]
    pub fn scenario(&self) -> &RecognitionScenario {
        &self.scenario
    }

    #[must_use]
    pub fn state(&self) -> &RecognitionState {
        &self.state
    }

    /// Choose an option; may be changed freely until the answer is submitted.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionError::UnknownOption` for ids the scenario does not
    /// offer, or `AlreadyRevealed` after submission.
    pub fn select(&mut self, option_id: &str) -> Result<(), RecognitionError> {
        if matches!(self.state, RecognitionState::Revealed(_)) {
            return Err(RecognitionError::AlreadyRevealed);
        }
        if self.scenario.option(option_id).is_none() {
            return Err(RecognitionError::UnknownOption(option_id.to_owned()));
        }
        self.state = RecognitionState::Answered {
            option: option_id.to_owned(),
        };
        Ok(())
    }

    /// Grade the selected option, record the result and reveal the answer.
    ///
    /// A scenario already in `completed` is revealed again without touching
    /// the stored progress.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionError::NoSelection` before `select`,
    /// `AlreadyRevealed` on a second submit, or `Catalog` when the scenario
    /// marks no option correct.
    pub fn submit(
        &mut self,
        ctx: &mut SessionContext,
    ) -> Result<RecognitionReveal, RecognitionError> {
        let selected = match &self.state {
            RecognitionState::Unanswered => return Err(RecognitionError::NoSelection),
            RecognitionState::Revealed(_) => return Err(RecognitionError::AlreadyRevealed),
            RecognitionState::Answered { option } => option.clone(),
        };
        let correct = self
            .scenario
            .correct_option()
            .ok_or_else(|| CatalogError::NoCorrectOption(self.scenario.id.clone()))?
            .clone();
        let is_correct = selected == correct.id;

        let mut next = (*ctx.progress()).clone();
        let newly_completed = next.record_recognition(
            &self.module,
            &self.scenario.id,
            correct.principle_key(),
            is_correct,
        );
        if newly_completed {
            ctx.commit(next);
            tracing::info!(
                module = %self.module,
                scenario = %self.scenario.id,
                is_correct,
                "recognition scenario completed"
            );
        }

        let reveal = RecognitionReveal {
            selected,
            is_correct,
            correct_option: correct,
            explanation: self.scenario.explanation.clone(),
            spotlight: self.scenario.spotlight.clone(),
            newly_completed,
        };
        self.state = RecognitionState::Revealed(reveal.clone());
        Ok(reveal)
    }
}
