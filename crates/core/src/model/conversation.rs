use serde::{Deserialize, Serialize};

use crate::model::feedback::{CoachingNote, Debrief};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Counterpart,
    Learner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Transcript, per-turn coaching notes and the optional debrief of one dialogue.
///
/// Note `i` always belongs to learner turn `i`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    turns: Vec<Turn>,
    notes: Vec<CoachingNote>,
    debrief: Option<Debrief>,
}

impl ConversationState {
    /// Start a conversation with the counterpart's opening line.
    #[must_use]
    pub fn opened_with(opening: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn {
                speaker: Speaker::Counterpart,
                text: opening.into(),
            }],
            notes: Vec::new(),
            debrief: None,
        }
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn notes(&self) -> &[CoachingNote] {
        &self.notes
    }

    #[must_use]
    pub fn debrief(&self) -> Option<&Debrief> {
        self.debrief.as_ref()
    }

    /// Number of learner turns so far.
    #[must_use]
    pub fn learner_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::Learner)
            .count()
    }

    pub fn push_learner(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Learner,
            text: text.into(),
        });
    }

    pub fn push_counterpart(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Counterpart,
            text: text.into(),
        });
    }

    /// Remove the trailing learner turn. Returns it if the last turn was the learner's.
    pub fn pop_learner(&mut self) -> Option<Turn> {
        if self.turns.last().map(|t| t.speaker) == Some(Speaker::Learner) {
            self.turns.pop()
        } else {
            None
        }
    }

    pub fn push_note(&mut self, note: CoachingNote) {
        self.notes.push(note);
    }

    pub fn set_debrief(&mut self, debrief: Debrief) {
        self.debrief = Some(debrief);
    }

    /// Render the transcript as `"<name>: text"` lines, the learner shown as "You".
    #[must_use]
    pub fn render(&self, counterpart_name: &str) -> String {
        self.turns
            .iter()
            .map(|t| match t.speaker {
                Speaker::Counterpart => format!("{counterpart_name}: {}", t.text),
                Speaker::Learner => format!("You: {}", t.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_only_removes_learner_turns() {
        let mut convo = ConversationState::opened_with("Thanks for coming in.");
        assert!(convo.pop_learner().is_none());

        convo.push_learner("Happy to be here.");
        assert_eq!(convo.learner_turns(), 1);
        let popped = convo.pop_learner().unwrap();
        assert_eq!(popped.text, "Happy to be here.");
        assert_eq!(convo.turns().len(), 1);
        assert_eq!(convo.learner_turns(), 0);
    }

    #[test]
    fn render_labels_speakers() {
        let mut convo = ConversationState::opened_with("Hello.");
        convo.push_learner("Hi there.");
        assert_eq!(convo.render("Dana Chen"), "Dana Chen: Hello.\nYou: Hi there.");
    }
}
