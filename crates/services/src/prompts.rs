//! Prompt builders, one per completion contract.

use std::fmt;

use gym_core::model::{CoachingScenario, DialogueScenario};

/// Which reply a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    Grade,
    Counterpart,
    TurnNote,
    Debrief,
}

impl Contract {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grade => "grade",
            Self::Counterpart => "counterpart",
            Self::TurnNote => "turn_note",
            Self::Debrief => "debrief",
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System instructions plus the single user message of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub contract: Contract,
    pub system: String,
    pub user: String,
}

const GRADE_SCHEMA: &str = r#"{"principles_detected": [{"name": "principle name", "evidence": "quote or description from their response"}], "rating": 3, "rating_justification": "one sentence", "what_worked": ["specific thing 1", "specific thing 2"], "growth_opportunity": {"issue": "what to improve", "why": "explanation", "how": "specific suggestion"}, "enhanced_version": "the rewritten response"}"#;

const NOTE_SCHEMA: &str = r#"{"principle_used": ["principle name or None detected"], "effectiveness": "one sentence", "tip": "one concrete suggestion for their next response"}"#;

const DEBRIEF_SCHEMA: &str = r#"{"overall_rating": 4, "principles_used": ["principles used across the conversation"], "best_moment": "their strongest persuasion move", "missed_opportunity": "one thing they could have done better", "key_takeaway": "one sentence to remember"}"#;

fn json_only(schema: &str) -> String {
    format!("Reply with JSON only, no prose and no markdown fences, in exactly this shape:\n{schema}")
}

/// Grade a free-text coached response.
#[must_use]
pub fn grade(scenario: &CoachingScenario, definitions: &str, response: &str) -> Prompt {
    let system = format!(
        "You coach a learner who is new to persuasion fundamentals and grade one practice response.\n\n\
         Module principles:\n{definitions}\n\n\
         Principles this scenario targets: {targets}\n\n\
         Scenario: {prompt}\n\n\
         Assess the response:\n\
         1. Which module principles it uses, with the words that show each one.\n\
         2. A 1-5 rating with a one-sentence justification.\n\
         3. One or two concrete things that worked.\n\
         4. One growth opportunity: the issue, why fixing it makes the response stronger, and how.\n\
         5. A rewrite that applies the improvement while keeping the learner's voice and intent.\n\n\
         Be encouraging but specific; never generic or patronising.\n\n{format}",
        targets = scenario.principles.join(", "),
        prompt = scenario.prompt,
        format = json_only(GRADE_SCHEMA),
    );
    Prompt {
        contract: Contract::Grade,
        system,
        user: response.to_owned(),
    }
}

/// In-character continuation of a dialogue.
#[must_use]
pub fn counterpart(scenario: &DialogueScenario, transcript: &str, learner_text: &str) -> Prompt {
    let character = &scenario.character;
    let system = format!(
        "You are {name} in a persuasion training exercise and stay in character throughout.\n\n\
         Who you are: {traits}\n\
         Situation: {setup}\n\
         The other person is trying to persuade you using Cialdini, Voss and Aristotle.\n\n\
         React the way a real person would. Good technique earns gradual movement; \
         heavy-handed or off-target moves get natural pushback. You are neither a pushover \
         nor unreachable. Never break character or name persuasion principles.\n\n\
         Conversation so far:\n{transcript}\n\n\
         Answer in character in 2-4 natural, conversational sentences.",
        name = character.name,
        traits = character.traits,
        setup = scenario.setup,
    );
    Prompt {
        contract: Contract::Counterpart,
        system,
        user: learner_text.to_owned(),
    }
}

/// Sidebar coaching for the learner's latest turn.
#[must_use]
pub fn turn_note(
    scenario: &DialogueScenario,
    definitions: &str,
    transcript: &str,
    learner_text: &str,
) -> Prompt {
    let system = format!(
        "You give real-time feedback during a persuasion training conversation.\n\n\
         Principles being practised:\n{definitions}\n\n\
         Scenario: {setup}\n\
         Conversation so far:\n{transcript}\n\
         The learner's latest line: {learner_text}\n\n\
         Keep it short; it is shown in a sidebar. If no principle was used, say \"None detected\".\n\n{format}",
        setup = scenario.setup,
        format = json_only(NOTE_SCHEMA),
    );
    Prompt {
        contract: Contract::TurnNote,
        system,
        user: learner_text.to_owned(),
    }
}

/// Closing debrief over the full conversation.
#[must_use]
pub fn debrief(scenario: &DialogueScenario, definitions: &str, transcript: &str) -> Prompt {
    let system = format!(
        "You debrief a learner after a persuasion training conversation.\n\n\
         Principles being practised:\n{definitions}\n\n\
         Scenario: {setup}\n\
         Full conversation:\n{transcript}\n\n\
         Rate the whole conversation from 1 to 5 and list every principle the learner used.\n\n{format}",
        setup = scenario.setup,
        format = json_only(DEBRIEF_SCHEMA),
    );
    Prompt {
        contract: Contract::Debrief,
        system,
        user: "Please provide the debrief.".to_owned(),
    }
}
