//! Phase 3: a bounded conversation with a simulated counterpart.
//!
//! Each learner turn issues two concurrent requests, the in-character reply
//! and a coaching note. Only the reply is load-bearing: if it fails the turn
//! is rolled back, while a failed note degrades to a placeholder. After the
//! final exchange a debrief closes the scenario.

use gym_core::model::{
    CoachingNote, ConversationState, Debrief, DialogueScenario, ModuleId, Phase, ScenarioId,
};

use crate::completion;
use crate::context::SessionContext;
use crate::error::DialogueError;
use crate::prompts;
use crate::reply::{parse_coaching_note, parse_debrief};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// Only the counterpart's opening line so far.
    Opening,
    AwaitingInput,
    AwaitingResponse,
    AwaitingDebrief,
    Debriefed,
}

/// Result of one successful learner turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub note: CoachingNote,
    /// Present when this turn was the last exchange.
    pub debrief: Option<Debrief>,
}

#[derive(Debug)]
pub struct Dialogue {
    module: ModuleId,
    scenario: DialogueScenario,
    definitions: String,
    conversation: ConversationState,
    state: DialogueState,
    completion_recorded: bool,
}

impl Dialogue {
    /// Open a scenario, seeding the counterpart's opening line.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Catalog` if the module or scenario is unknown.
    pub fn open(
        ctx: &SessionContext,
        module: &ModuleId,
        scenario: &ScenarioId,
    ) -> Result<Self, DialogueError> {
        let catalog = ctx.catalog();
        let scenario = catalog.dialogue(module, scenario)?.clone();
        let definitions = catalog.principle_definitions(module)?;
        Ok(Self {
            module: module.clone(),
            conversation: ConversationState::opened_with(scenario.opening.clone()),
            scenario,
            definitions,
            state: DialogueState::Opening,
            completion_recorded: false,
        })
    }

    #[must_use]
    pub fn scenario(&self) -> &DialogueScenario {
        &self.scenario
    }

    #[must_use]
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    #[must_use]
    pub fn state(&self) -> DialogueState {
        self.state
    }

    /// Learner turns allowed in total, never less than one.
    #[must_use]
    pub fn max_exchanges(&self) -> usize {
        usize::try_from(self.scenario.max_exchanges.max(1)).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn exchanges_remaining(&self) -> usize {
        self.max_exchanges()
            .saturating_sub(self.conversation.learner_turns())
    }

    /// Play one learner turn.
    ///
    /// On success the counterpart's reply and the turn's coaching note are
    /// appended in order; when the turn was the last exchange the debrief is
    /// generated before returning.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::EmptyTurn` for blank text, `ConversationOver`
    /// once the exchange limit is reached, or `Completion` when the
    /// in-character request fails. In the last case the transcript is left
    /// exactly as it was before the call.
    pub async fn submit_turn(
        &mut self,
        ctx: &mut SessionContext,
        text: &str,
    ) -> Result<TurnOutcome, DialogueError> {
        self.recover_interrupted_turn();
        match self.state {
            DialogueState::AwaitingDebrief | DialogueState::Debriefed => {
                return Err(DialogueError::ConversationOver);
            }
            DialogueState::Opening
            | DialogueState::AwaitingInput
            | DialogueState::AwaitingResponse => {}
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(DialogueError::EmptyTurn);
        }

        let resume = self.state;
        self.conversation.push_learner(text);
        self.state = DialogueState::AwaitingResponse;

        let transcript = self.conversation.render(&self.scenario.character.name);
        let reply_prompt = prompts::counterpart(&self.scenario, &transcript, text);
        let note_prompt = prompts::turn_note(&self.scenario, &self.definitions, &transcript, text);
        let service = ctx.completion();
        let (reply, note) = tokio::join!(
            completion::request(service.as_ref(), &reply_prompt),
            completion::request(service.as_ref(), &note_prompt),
        );

        let reply = match reply {
            Ok(reply) => reply.trim().to_owned(),
            Err(err) => {
                self.conversation.pop_learner();
                self.state = resume;
                tracing::warn!(
                    scenario = %self.scenario.id,
                    error = %err,
                    "counterpart reply failed; turn rolled back"
                );
                return Err(err.into());
            }
        };
        let note = match note
            .map_err(|err| err.to_string())
            .and_then(|raw| parse_coaching_note(&raw).map_err(|err| err.to_string()))
        {
            Ok(note) => note,
            Err(reason) => {
                tracing::warn!(scenario = %self.scenario.id, %reason, "coaching note unavailable");
                CoachingNote::unavailable()
            }
        };

        self.conversation.push_counterpart(reply.clone());
        self.conversation.push_note(note.clone());
        tracing::debug!(
            scenario = %self.scenario.id,
            turn = self.conversation.learner_turns(),
            "dialogue turn completed"
        );

        if self.exchanges_remaining() > 0 {
            self.state = DialogueState::AwaitingInput;
            return Ok(TurnOutcome {
                reply,
                note,
                debrief: None,
            });
        }

        self.state = DialogueState::AwaitingDebrief;
        let debrief = self.run_debrief(ctx).await;
        Ok(TurnOutcome {
            reply,
            note,
            debrief: Some(debrief),
        })
    }

    /// Ask for the debrief again after a degraded one.
    ///
    /// A debrief that already succeeded is returned as is without a request.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::InProgress` while exchanges remain.
    pub async fn retry_debrief(
        &mut self,
        ctx: &mut SessionContext,
    ) -> Result<Debrief, DialogueError> {
        self.recover_interrupted_turn();
        match self.state {
            DialogueState::Opening
            | DialogueState::AwaitingInput
            | DialogueState::AwaitingResponse => Err(DialogueError::InProgress),
            DialogueState::Debriefed => match self.conversation.debrief() {
                Some(debrief) if !debrief.is_degraded() => Ok(debrief.clone()),
                _ => Ok(self.run_debrief(ctx).await),
            },
            DialogueState::AwaitingDebrief => Ok(self.run_debrief(ctx).await),
        }
    }

    async fn run_debrief(&mut self, ctx: &mut SessionContext) -> Debrief {
        self.state = DialogueState::AwaitingDebrief;
        let transcript = self.conversation.render(&self.scenario.character.name);
        let prompt = prompts::debrief(&self.scenario, &self.definitions, &transcript);
        let service = ctx.completion();
        let reply = completion::request(service.as_ref(), &prompt).await;
        let parsed = match reply {
            Ok(raw) => parse_debrief(&raw).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };

        let debrief = match parsed {
            Ok(debrief) => {
                self.record(ctx, &debrief);
                debrief
            }
            Err(reason) => {
                tracing::warn!(
                    scenario = %self.scenario.id,
                    %reason,
                    "debrief unavailable; using placeholder"
                );
                Debrief::degraded()
            }
        };
        self.conversation.set_debrief(debrief.clone());
        self.state = DialogueState::Debriefed;
        debrief
    }

    fn record(&mut self, ctx: &mut SessionContext, debrief: &Debrief) {
        if self.completion_recorded {
            return;
        }
        let mut next = (*ctx.progress()).clone();
        let newly_completed = next.record_rated(
            &self.module,
            Phase::Dialogue,
            &self.scenario.id,
            debrief.overall_rating,
            &debrief.principles_used,
        );
        ctx.commit(next);
        self.completion_recorded = true;
        tracing::info!(
            module = %self.module,
            scenario = %self.scenario.id,
            rating = debrief.overall_rating,
            newly_completed,
            "dialogue debriefed"
        );
    }

    /// Undo a turn whose future was dropped while awaiting the counterpart.
    fn recover_interrupted_turn(&mut self) {
        if self.state != DialogueState::AwaitingResponse {
            return;
        }
        self.conversation.pop_learner();
        self.state = if self.conversation.learner_turns() == 0 {
            DialogueState::Opening
        } else {
            DialogueState::AwaitingInput
        };
    }
}
