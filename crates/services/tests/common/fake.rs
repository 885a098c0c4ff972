//! Completion fake and catalog fixture shared by the unit and integration
//! tests of the services crate.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gym_core::model::{Catalog, ModuleId};

use super::{CompletionError, CompletionService, Contract, Prompt};

pub const CATALOG: &str = include_str!("../fixtures/catalog.json");

pub const GRADE: &str = r#"```json
{"principles_detected": [{"name": "Ethos", "evidence": "ten years"}, {"name": "Liking", "evidence": "we both"}],
 "rating": 4, "rating_justification": "Credible and warm.", "what_worked": ["Record"],
 "growth_opportunity": {"issue": "No ask", "why": "Ends flat", "how": "Close with a request"},
 "enhanced_version": "Rewritten."}
```"#;

pub const NOTE: &str =
    r#"{"principle_used": ["Tactical Empathy"], "effectiveness": "Good label.", "tip": "Pause."}"#;

pub const DEBRIEF: &str = r#"Here is the debrief: {"overall_rating": 3, "principles_used": ["Ethos", "Tactical Empathy"], "best_moment": "The label.", "missed_opportunity": "No ask.", "key_takeaway": "Ask for the vote."}"#;

pub fn module() -> ModuleId {
    ModuleId::new("module-1")
}

pub fn catalog() -> Catalog {
    Catalog::from_json_str(CATALOG).unwrap()
}

#[derive(Default)]
struct Script {
    standing: HashMap<Contract, String>,
    queued: HashMap<Contract, VecDeque<Result<String, ()>>>,
    delays: HashMap<Contract, Duration>,
    finished: Vec<Contract>,
    user_messages: Vec<(Contract, String)>,
}

/// Completion fake keyed by the contract each prompt carries.
///
/// Queued outcomes are consumed first; otherwise the standing reply is used,
/// and a contract with neither fails with a 502.
#[derive(Clone, Default)]
pub struct FakeCompletion {
    script: Arc<Mutex<Script>>,
}

impl FakeCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake that answers every contract successfully.
    pub fn happy() -> Self {
        Self::new()
            .reply(Contract::Grade, GRADE)
            .reply(Contract::Counterpart, "I hear you. Go on.")
            .reply(Contract::TurnNote, NOTE)
            .reply(Contract::Debrief, DEBRIEF)
    }

    pub fn reply(self, contract: Contract, text: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .standing
            .insert(contract, text.to_owned());
        self
    }

    pub fn clear(&self, contract: Contract) {
        self.script.lock().unwrap().standing.remove(&contract);
    }

    pub fn fail_next(&self, contract: Contract) {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(contract)
            .or_default()
            .push_back(Err(()));
    }

    pub fn reply_next(&self, contract: Contract, text: &str) {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(contract)
            .or_default()
            .push_back(Ok(text.to_owned()));
    }

    pub fn delay(self, contract: Contract, delay: Duration) -> Self {
        self.script.lock().unwrap().delays.insert(contract, delay);
        self
    }

    pub fn calls(&self, contract: Contract) -> usize {
        self.script
            .lock()
            .unwrap()
            .user_messages
            .iter()
            .filter(|(c, _)| *c == contract)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.script.lock().unwrap().user_messages.len()
    }

    /// Contracts in the order their replies resolved.
    pub fn finished(&self) -> Vec<Contract> {
        self.script.lock().unwrap().finished.clone()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let contract = prompt.contract;
        let (outcome, delay) = {
            let mut script = self.script.lock().unwrap();
            script.user_messages.push((contract, prompt.user.clone()));
            let queued = script
                .queued
                .get_mut(&contract)
                .and_then(VecDeque::pop_front);
            let outcome = match queued {
                Some(outcome) => outcome,
                None => script.standing.get(&contract).cloned().ok_or(()),
            };
            (outcome, script.delays.get(&contract).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.script.lock().unwrap().finished.push(contract);
        outcome.map_err(|()| CompletionError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY))
    }
}
