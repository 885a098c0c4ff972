//! Structured replies produced by the completion service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Marker the coach uses when no principle was applied in a turn.
pub const NONE_DETECTED: &str = "None detected";

const UNAVAILABLE_PRINCIPLE: &str = "Analysis unavailable";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FeedbackError {
    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(u8),
}

fn check_rating(rating: u8) -> Result<u8, FeedbackError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(FeedbackError::RatingOutOfRange(rating))
    }
}

//
// ─── COACHED RESPONSE GRADE ───────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPrinciple {
    pub name: String,
    #[serde(default)]
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthOpportunity {
    pub issue: String,
    pub why: String,
    pub how: String,
}

/// Grade for a free-text coached response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    #[serde(default)]
    pub principles_detected: Vec<DetectedPrinciple>,
    pub rating: u8,
    pub rating_justification: String,
    #[serde(default)]
    pub what_worked: Vec<String>,
    pub growth_opportunity: GrowthOpportunity,
    pub enhanced_version: String,
}

impl GradeReport {
    /// # Errors
    ///
    /// Returns `FeedbackError::RatingOutOfRange` if the rating is not 1-5.
    pub fn validate(self) -> Result<Self, FeedbackError> {
        check_rating(self.rating)?;
        Ok(self)
    }

    #[must_use]
    pub fn principle_names(&self) -> Vec<String> {
        self.principles_detected
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }
}

//
// ─── PER-TURN COACHING NOTE ───────────────────────────────────────────────────
//

/// Sidebar note for a single learner turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingNote {
    pub principle_used: Vec<String>,
    pub effectiveness: String,
    pub tip: String,
}

impl CoachingNote {
    /// Stand-in used when the coach request fails or cannot be parsed.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            principle_used: vec![UNAVAILABLE_PRINCIPLE.to_owned()],
            effectiveness: "Could not parse feedback.".to_owned(),
            tip: "Continue the conversation naturally.".to_owned(),
        }
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.principle_used.len() == 1 && self.principle_used[0] == UNAVAILABLE_PRINCIPLE
    }

    #[must_use]
    pub fn detected_nothing(&self) -> bool {
        self.principle_used.is_empty()
            || self
                .principle_used
                .iter()
                .all(|p| p.eq_ignore_ascii_case(NONE_DETECTED))
    }
}

//
// ─── DEBRIEF ──────────────────────────────────────────────────────────────────
//

/// Closing summary of a dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debrief {
    pub overall_rating: u8,
    #[serde(default)]
    pub principles_used: Vec<String>,
    pub best_moment: String,
    #[serde(default)]
    pub missed_opportunity: String,
    pub key_takeaway: String,
}

impl Debrief {
    /// # Errors
    ///
    /// Returns `FeedbackError::RatingOutOfRange` if the rating is not 1-5.
    pub fn validate(self) -> Result<Self, FeedbackError> {
        check_rating(self.overall_rating)?;
        Ok(self)
    }

    /// Synthetic zero-rated debrief used when the service cannot produce one.
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            overall_rating: 0,
            principles_used: Vec::new(),
            best_moment: "Debrief unavailable.".to_owned(),
            missed_opportunity: String::new(),
            key_takeaway: "Keep practicing!".to_owned(),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.overall_rating == 0
    }
}
