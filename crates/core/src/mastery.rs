//! Per-principle strength classification.
//!
//! A rated average wins whenever one exists; otherwise the binary success
//! rate decides. There is no smoothing: a single attempt can move a
//! principle across a boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{PrincipleStat, Progress};

pub const STRONG_RATING: f64 = 4.0;
pub const DEVELOPING_RATING: f64 = 2.5;
pub const STRONG_RATE: f64 = 0.7;
pub const DEVELOPING_RATE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strength {
    Strong,
    Developing,
    NeedsWork,
    Unattempted,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::Strong => "Strong",
            Strength::Developing => "Developing",
            Strength::NeedsWork => "Needs work",
            Strength::Unattempted => "Not attempted",
        };
        f.write_str(label)
    }
}

/// Classify a principle by name against the learner's progress.
#[must_use]
pub fn classify(principle: &str, progress: &Progress) -> Strength {
    progress
        .principle_stat(principle)
        .map_or(Strength::Unattempted, classify_stat)
}

#[must_use]
pub fn classify_stat(stat: &PrincipleStat) -> Strength {
    if stat.attempts() == 0 {
        return Strength::Unattempted;
    }
    if let Some(avg) = stat.avg_rating() {
        return band(avg, STRONG_RATING, DEVELOPING_RATING);
    }
    match stat.success_rate() {
        Some(rate) => band(rate, STRONG_RATE, DEVELOPING_RATE),
        None => Strength::Unattempted,
    }
}

fn band(value: f64, strong: f64, developing: f64) -> Strength {
    if value >= strong {
        Strength::Strong
    } else if value >= developing {
        Strength::Developing
    } else {
        Strength::NeedsWork
    }
}
