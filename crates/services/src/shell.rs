//! Routes learner actions to the one active scenario controller.

use gym_core::model::{Debrief, GradeReport, ModuleId, Phase, Progress, ScenarioId};
use gym_core::remaining_to_unlock;
use std::sync::Arc;

use crate::coaching::CoachingExercise;
use crate::context::SessionContext;
use crate::dashboard::{Dashboard, ReferenceSection, reference_library};
use crate::dialogue::{Dialogue, TurnOutcome};
use crate::error::ShellError;
use crate::progress_store::SaveStatus;
use crate::recognition::{RecognitionDrill, RecognitionReveal};

#[derive(Debug)]
pub enum ActiveScenario {
    Recognition(RecognitionDrill),
    Coaching(CoachingExercise),
    Dialogue(Dialogue),
}

impl ActiveScenario {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Recognition(_) => Phase::Recognition,
            Self::Coaching(_) => Phase::Coaching,
            Self::Dialogue(_) => Phase::Dialogue,
        }
    }

    #[must_use]
    pub fn scenario_id(&self) -> &ScenarioId {
        match self {
            Self::Recognition(drill) => &drill.scenario().id,
            Self::Coaching(exercise) => &exercise.scenario().id,
            Self::Dialogue(dialogue) => &dialogue.scenario().id,
        }
    }
}

/// One learner session: the shared context plus at most one open scenario.
///
/// Opening a scenario replaces whatever was open before; an unfinished
/// dialogue is abandoned without recording anything.
#[derive(Debug)]
pub struct SessionShell {
    ctx: SessionContext,
    active: Option<ActiveScenario>,
}

impl SessionShell {
    #[must_use]
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx, active: None }
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveScenario> {
        self.active.as_ref()
    }

    /// Open a scenario of `phase`, or the next uncompleted one when `scenario` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Locked` when the previous phase has too few
    /// completions, or `Catalog` when the module or scenario is unknown.
    pub fn open(
        &mut self,
        module: &ModuleId,
        phase: Phase,
        scenario: Option<&ScenarioId>,
    ) -> Result<&ActiveScenario, ShellError> {
        let catalog = self.ctx.catalog();
        catalog.module(module)?;
        let progress = self.ctx.progress();
        let remaining = remaining_to_unlock(module, phase, &progress);
        if remaining > 0 {
            return Err(ShellError::Locked {
                module: module.clone(),
                phase,
                remaining,
            });
        }
        let id = match scenario {
            Some(id) => id.clone(),
            None => catalog.next_open_scenario(module, phase, &progress)?,
        };

        let next = match phase {
            Phase::Recognition => {
                ActiveScenario::Recognition(RecognitionDrill::open(&self.ctx, module, &id)?)
            }
            Phase::Coaching => {
                ActiveScenario::Coaching(CoachingExercise::open(&self.ctx, module, &id)?)
            }
            Phase::Dialogue => ActiveScenario::Dialogue(Dialogue::open(&self.ctx, module, &id)?),
        };
        if let Some(previous) = self.active.take() {
            tracing::debug!(scenario = %previous.scenario_id(), "scenario closed");
        }
        tracing::debug!(module = %module, %phase, scenario = %id, "scenario opened");
        Ok(&*self.active.insert(next))
    }

    pub fn close(&mut self) {
        self.active = None;
    }

    //
    // ─── PHASE 1 ──────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `ShellError::NotActive` unless a recognition scenario is open.
    pub fn select_option(&mut self, option_id: &str) -> Result<(), ShellError> {
        match &mut self.active {
            Some(ActiveScenario::Recognition(drill)) => Ok(drill.select(option_id)?),
            _ => Err(ShellError::NotActive(Phase::Recognition)),
        }
    }

    /// # Errors
    ///
    /// Returns `ShellError::NotActive` unless a recognition scenario is open.
    pub fn submit_recognition(&mut self) -> Result<RecognitionReveal, ShellError> {
        match &mut self.active {
            Some(ActiveScenario::Recognition(drill)) => Ok(drill.submit(&mut self.ctx)?),
            _ => Err(ShellError::NotActive(Phase::Recognition)),
        }
    }

    //
    // ─── PHASE 2 ──────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `ShellError::NotActive` unless a coaching scenario is open.
    pub async fn request_coaching(&mut self, text: &str) -> Result<Option<GradeReport>, ShellError> {
        match &mut self.active {
            Some(ActiveScenario::Coaching(exercise)) => {
                Ok(exercise.request_coaching(&mut self.ctx, text).await?)
            }
            _ => Err(ShellError::NotActive(Phase::Coaching)),
        }
    }

    /// # Errors
    ///
    /// Returns `ShellError::NotActive` unless a coaching scenario is open.
    pub fn try_again(&mut self) -> Result<(), ShellError> {
        match &mut self.active {
            Some(ActiveScenario::Coaching(exercise)) => {
                exercise.try_again();
                Ok(())
            }
            _ => Err(ShellError::NotActive(Phase::Coaching)),
        }
    }

    //
    // ─── PHASE 3 ──────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `ShellError::NotActive` unless a dialogue is open.
    pub async fn send_turn(&mut self, text: &str) -> Result<TurnOutcome, ShellError> {
        match &mut self.active {
            Some(ActiveScenario::Dialogue(dialogue)) => {
                Ok(dialogue.submit_turn(&mut self.ctx, text).await?)
            }
            _ => Err(ShellError::NotActive(Phase::Dialogue)),
        }
    }

    /// # Errors
    ///
    /// Returns `ShellError::NotActive` unless a dialogue is open.
    pub async fn retry_debrief(&mut self) -> Result<Debrief, ShellError> {
        match &mut self.active {
            Some(ActiveScenario::Dialogue(dialogue)) => {
                Ok(dialogue.retry_debrief(&mut self.ctx).await?)
            }
            _ => Err(ShellError::NotActive(Phase::Dialogue)),
        }
    }

    //
    // ─── PROGRESS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn progress(&self) -> Arc<Progress> {
        self.ctx.progress()
    }

    #[must_use]
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::build(self.ctx.catalog(), &self.ctx.progress())
    }

    /// Principle reference library, grouped by module.
    #[must_use]
    pub fn reference(&self) -> Vec<ReferenceSection> {
        reference_library(self.ctx.catalog())
    }

    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.ctx.save_status()
    }

    pub async fn flush(&self) {
        self.ctx.flush().await;
    }
}
