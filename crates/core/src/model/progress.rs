use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::feedback::NONE_DETECTED;
use crate::model::ids::{ModuleId, ScenarioId};
use crate::model::phase::Phase;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("successes ({successes}) exceed attempts ({attempts})")]
    SuccessesExceedAttempts { attempts: u32, successes: u32 },

    #[error("rated attempts ({rated}) exceed attempts ({attempts})")]
    RatedExceedAttempts { attempts: u32, rated: u32 },

    #[error("average rating {0} is outside 0..=5")]
    RatingOutOfRange(String),
}

//
// ─── PRINCIPLE STAT ───────────────────────────────────────────────────────────
//

/// Accumulated performance on one persuasion principle.
///
/// Binary attempts (recognition drills) move `successes`; rated attempts
/// (coached responses and dialogue debriefs) move the running average. Both
/// count toward `attempts`, so one record can carry both regimes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "PrincipleStatRecord", into = "PrincipleStatRecord")]
pub struct PrincipleStat {
    attempts: u32,
    successes: u32,
    rated_attempts: u32,
    avg_rating: Option<f64>,
}

impl PrincipleStat {
    /// Rehydrate a stat from persisted values.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the counters are inconsistent or the
    /// average falls outside `0..=5`.
    pub fn from_persisted(
        attempts: u32,
        successes: u32,
        rated_attempts: u32,
        avg_rating: Option<f64>,
    ) -> Result<Self, ProgressError> {
        if successes > attempts {
            return Err(ProgressError::SuccessesExceedAttempts {
                attempts,
                successes,
            });
        }
        if rated_attempts > attempts {
            return Err(ProgressError::RatedExceedAttempts {
                attempts,
                rated: rated_attempts,
            });
        }
        if let Some(avg) = avg_rating {
            if !(0.0..=5.0).contains(&avg) {
                return Err(ProgressError::RatingOutOfRange(avg.to_string()));
            }
        }
        Ok(Self {
            attempts,
            successes,
            rated_attempts,
            avg_rating,
        })
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn successes(&self) -> u32 {
        self.successes
    }

    #[must_use]
    pub fn rated_attempts(&self) -> u32 {
        self.rated_attempts
    }

    /// Mean of all rated attempts; `None` until the first rating arrives.
    #[must_use]
    pub fn avg_rating(&self) -> Option<f64> {
        self.avg_rating
    }

    /// `successes / attempts`, or `None` when nothing was attempted.
    #[must_use]
    pub fn success_rate(&self) -> Option<f64> {
        (self.attempts > 0).then(|| f64::from(self.successes) / f64::from(self.attempts))
    }

    pub fn record_binary(&mut self, correct: bool) {
        self.attempts = self.attempts.saturating_add(1);
        if correct {
            self.successes = self.successes.saturating_add(1);
        }
    }

    /// Fold a rating into the running average.
    ///
    /// `new = (old * n + rating) / (n + 1)` where `n` counts rated attempts
    /// only, so the average stays the plain mean of the ratings even when the
    /// same principle was also drilled in the binary regime.
    pub fn record_rating(&mut self, rating: u8) {
        let n = f64::from(self.rated_attempts);
        let old = self.avg_rating.unwrap_or(0.0);
        let next = (old * n + f64::from(rating.min(5))) / (n + 1.0);
        self.avg_rating = Some(next);
        self.rated_attempts = self.rated_attempts.saturating_add(1);
        self.attempts = self.attempts.saturating_add(1);
    }
}

#[derive(Serialize, Deserialize)]
struct PrincipleStatRecord {
    attempts: u32,
    #[serde(default)]
    successes: u32,
    #[serde(default)]
    rated_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avg_rating: Option<f64>,
}

impl TryFrom<PrincipleStatRecord> for PrincipleStat {
    type Error = ProgressError;

    fn try_from(record: PrincipleStatRecord) -> Result<Self, Self::Error> {
        Self::from_persisted(
            record.attempts,
            record.successes,
            record.rated_attempts,
            record.avg_rating,
        )
    }
}

impl From<PrincipleStat> for PrincipleStatRecord {
    fn from(stat: PrincipleStat) -> Self {
        Self {
            attempts: stat.attempts,
            successes: stat.successes,
            rated_attempts: stat.rated_attempts,
            avg_rating: stat.avg_rating,
        }
    }
}

//
// ─── SCORES ───────────────────────────────────────────────────────────────────
//

/// Outcome recorded for a completed scenario; the shape depends on the phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioScore {
    Recognition {
        correct: bool,
        principles_tested: Vec<String>,
    },
    Coaching {
        rating: u8,
        principles_used: Vec<String>,
    },
    Dialogue {
        overall_rating: u8,
        principles_used: Vec<String>,
    },
}

//
// ─── PHASE / MODULE PROGRESS ──────────────────────────────────────────────────
//

/// Completions and scores for one phase of one module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PhaseProgressRecord")]
pub struct PhaseProgress {
    completed: Vec<ScenarioId>,
    scores: BTreeMap<ScenarioId, ScenarioScore>,
}

impl PhaseProgress {
    #[must_use]
    pub fn completed(&self) -> &[ScenarioId] {
        &self.completed
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn is_completed(&self, id: &ScenarioId) -> bool {
        self.completed.contains(id)
    }

    #[must_use]
    pub fn score(&self, id: &ScenarioId) -> Option<&ScenarioScore> {
        self.scores.get(id)
    }

    /// Append `id` to the completed list. Returns `false` if it was already there.
    pub fn mark_completed(&mut self, id: &ScenarioId) -> bool {
        if self.is_completed(id) {
            return false;
        }
        self.completed.push(id.clone());
        true
    }

    pub fn set_score(&mut self, id: &ScenarioId, score: ScenarioScore) {
        self.scores.insert(id.clone(), score);
    }
}

#[derive(Deserialize)]
struct PhaseProgressRecord {
    #[serde(default)]
    completed: Vec<ScenarioId>,
    #[serde(default)]
    scores: BTreeMap<ScenarioId, ScenarioScore>,
}

impl From<PhaseProgressRecord> for PhaseProgress {
    fn from(record: PhaseProgressRecord) -> Self {
        // Hand-edited snapshots may repeat an id; keep the first occurrence.
        let mut phase = PhaseProgress {
            completed: Vec::with_capacity(record.completed.len()),
            scores: record.scores,
        };
        for id in &record.completed {
            phase.mark_completed(id);
        }
        phase
    }
}

/// Per-phase progress of a single module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleProgress {
    #[serde(default)]
    recognition: PhaseProgress,
    #[serde(default)]
    coaching: PhaseProgress,
    #[serde(default)]
    dialogue: PhaseProgress,
}

impl ModuleProgress {
    #[must_use]
    pub fn phase(&self, phase: Phase) -> &PhaseProgress {
        match phase {
            Phase::Recognition => &self.recognition,
            Phase::Coaching => &self.coaching,
            Phase::Dialogue => &self.dialogue,
        }
    }

    pub fn phase_mut(&mut self, phase: Phase) -> &mut PhaseProgress {
        match phase {
            Phase::Recognition => &mut self.recognition,
            Phase::Coaching => &mut self.coaching,
            Phase::Dialogue => &mut self.dialogue,
        }
    }

    /// Completed scenarios across all three phases.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        Phase::ALL
            .iter()
            .map(|phase| self.phase(*phase).completed_count())
            .sum()
    }
}

//
// ─── PROGRESS ─────────────────────────────────────────────────────────────────
//

/// The learner's whole mastery state.
///
/// Services never mutate a shared `Progress` in place: they clone the current
/// snapshot, apply one of the `record_*` operations and commit the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    modules: BTreeMap<ModuleId, ModuleProgress>,
    #[serde(default)]
    principle_stats: BTreeMap<String, PrincipleStat>,
    last_activity: DateTime<Utc>,
}

impl Progress {
    /// Fresh progress with nothing attempted.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            modules: BTreeMap::new(),
            principle_stats: BTreeMap::new(),
            last_activity: now,
        }
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&ModuleProgress> {
        self.modules.get(id)
    }

    #[must_use]
    pub fn modules(&self) -> &BTreeMap<ModuleId, ModuleProgress> {
        &self.modules
    }

    #[must_use]
    pub fn phase(&self, module: &ModuleId, phase: Phase) -> Option<&PhaseProgress> {
        self.module(module).map(|m| m.phase(phase))
    }

    /// Number of completed scenarios for `module` in `phase` (0 if never touched).
    #[must_use]
    pub fn completed_count(&self, module: &ModuleId, phase: Phase) -> usize {
        self.phase(module, phase)
            .map_or(0, PhaseProgress::completed_count)
    }

    #[must_use]
    pub fn is_completed(&self, module: &ModuleId, phase: Phase, scenario: &ScenarioId) -> bool {
        self.phase(module, phase)
            .is_some_and(|p| p.is_completed(scenario))
    }

    #[must_use]
    pub fn principle_stat(&self, name: &str) -> Option<&PrincipleStat> {
        self.principle_stats.get(name)
    }

    #[must_use]
    pub fn principle_stats(&self) -> &BTreeMap<String, PrincipleStat> {
        &self.principle_stats
    }

    fn phase_mut(&mut self, module: &ModuleId, phase: Phase) -> &mut PhaseProgress {
        self.modules
            .entry(module.clone())
            .or_default()
            .phase_mut(phase)
    }

    /// Record a recognition answer.
    ///
    /// Only the first completion of a scenario counts: replays return `false`
    /// and leave both the completed list and the principle stat untouched.
    pub fn record_recognition(
        &mut self,
        module: &ModuleId,
        scenario: &ScenarioId,
        principle: &str,
        correct: bool,
    ) -> bool {
        let phase = self.phase_mut(module, Phase::Recognition);
        if !phase.mark_completed(scenario) {
            return false;
        }
        phase.set_score(
            scenario,
            ScenarioScore::Recognition {
                correct,
                principles_tested: vec![principle.to_owned()],
            },
        );
        self.principle_stats
            .entry(principle.to_owned())
            .or_default()
            .record_binary(correct);
        true
    }

    /// Record a rated completion (coached response or dialogue debrief).
    ///
    /// The scenario is appended to `completed` once; the score is refreshed on
    /// every call. Each distinct principle folds `rating` into its running
    /// average; the "None detected" marker is skipped. Returns `true` when the scenario was newly completed.
    pub fn record_rated(
        &mut self,
        module: &ModuleId,
        phase: Phase,
        scenario: &ScenarioId,
        rating: u8,
        principles: &[String],
    ) -> bool {
        let score = match phase {
            Phase::Dialogue => ScenarioScore::Dialogue {
                overall_rating: rating,
                principles_used: principles.to_vec(),
            },
            Phase::Recognition | Phase::Coaching => ScenarioScore::Coaching {
                rating,
                principles_used: principles.to_vec(),
            },
        };
        let target = self.phase_mut(module, phase);
        let newly = target.mark_completed(scenario);
        target.set_score(scenario, score);

        let mut seen: Vec<&str> = Vec::with_capacity(principles.len());
        for name in principles {
            let name = name.trim();
            if name.is_empty()
                || name.eq_ignore_ascii_case(NONE_DETECTED)
                || seen.contains(&name)
            {
                continue;
            }
            seen.push(name);
            self.principle_stats
                .entry(name.to_owned())
                .or_default()
                .record_rating(rating);
        }
        newly
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn module() -> ModuleId {
        ModuleId::new("module-1")
    }

    #[test]
    fn recognition_replay_does_not_double_count() {
        let mut progress = Progress::new(fixed_now());
        let id = ScenarioId::new("m1-p1-s1");

        assert!(progress.record_recognition(&module(), &id, "Ethos", true));
        assert!(!progress.record_recognition(&module(), &id, "Ethos", false));

        assert_eq!(progress.completed_count(&module(), Phase::Recognition), 1);
        let stat = progress.principle_stat("Ethos").unwrap();
        assert_eq!(stat.attempts(), 1);
        assert_eq!(stat.successes(), 1);
        assert_eq!(
            progress
                .phase(&module(), Phase::Recognition)
                .unwrap()
                .score(&id),
            Some(&ScenarioScore::Recognition {
                correct: true,
                principles_tested: vec!["Ethos".into()],
            })
        );
    }

    #[test]
    fn running_average_matches_closed_form_mean() {
        let ratings = [5_u8, 2, 4, 1, 3, 5, 5];
        let mut stat = PrincipleStat::default();
        for r in ratings {
            stat.record_rating(r);
        }
        let mean = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
        assert!((stat.avg_rating().unwrap() - mean).abs() < 1e-9);
        assert_eq!(stat.attempts(), ratings.len() as u32);
    }

    #[test]
    fn average_ignores_earlier_binary_attempts() {
        let mut stat = PrincipleStat::default();
        stat.record_binary(true);
        stat.record_binary(false);
        stat.record_rating(2);
        stat.record_rating(4);

        assert_eq!(stat.attempts(), 4);
        assert_eq!(stat.successes(), 1);
        assert!((stat.avg_rating().unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rated_completion_refreshes_score_but_not_completed() {
        let mut progress = Progress::new(fixed_now());
        let id = ScenarioId::new("m1-p2-s1");
        let used = vec!["Liking".to_string(), "Liking".to_string()];

        assert!(progress.record_rated(&module(), Phase::Coaching, &id, 2, &used));
        assert!(!progress.record_rated(&module(), Phase::Coaching, &id, 4, &used));

        let phase = progress.phase(&module(), Phase::Coaching).unwrap();
        assert_eq!(phase.completed(), &[id.clone()]);
        assert_eq!(
            phase.score(&id),
            Some(&ScenarioScore::Coaching {
                rating: 4,
                principles_used: used.clone(),
            })
        );
        // duplicate names in one record count once
        assert_eq!(progress.principle_stat("Liking").unwrap().attempts(), 2);
    }

    #[test]
    fn none_detected_marker_is_not_a_principle() {
        let mut progress = Progress::new(fixed_now());
        let used = vec!["none detected".to_string(), " ".to_string()];

        progress.record_rated(
            &module(),
            Phase::Dialogue,
            &ScenarioId::new("m1-p3-s1"),
            2,
            &used,
        );

        assert!(progress.principle_stats().is_empty());
        assert_eq!(progress.completed_count(&module(), Phase::Dialogue), 1);
    }

    #[test]
    fn successes_never_exceed_attempts_across_regimes() {
        let mut progress = Progress::new(fixed_now());
        let ethos = vec!["Ethos".to_string()];
        let check = |progress: &Progress| {
            let stat = progress.principle_stat("Ethos").unwrap();
            assert!(stat.successes() <= stat.attempts());
            assert!(stat.rated_attempts() <= stat.attempts());
            assert!(stat.successes() + stat.rated_attempts() <= stat.attempts());
        };

        progress.record_recognition(&module(), &ScenarioId::new("m1-p1-s1"), "Ethos", true);
        check(&progress);
        progress.record_rated(&module(), Phase::Coaching, &ScenarioId::new("m1-p2-s1"), 5, &ethos);
        check(&progress);
        progress.record_recognition(&module(), &ScenarioId::new("m1-p1-s2"), "Ethos", true);
        check(&progress);
        progress.record_rated(&module(), Phase::Dialogue, &ScenarioId::new("m1-p3-s1"), 1, &ethos);
        check(&progress);
        progress.record_recognition(&module(), &ScenarioId::new("m1-p1-s3"), "Ethos", false);
        check(&progress);
        progress.record_rated(&module(), Phase::Coaching, &ScenarioId::new("m1-p2-s1"), 3, &ethos);
        check(&progress);

        let stat = progress.principle_stat("Ethos").unwrap();
        assert_eq!(stat.attempts(), 6);
        assert_eq!(stat.successes(), 2);
        assert_eq!(stat.rated_attempts(), 3);
        assert!((stat.avg_rating().unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn deserialization_rejects_inconsistent_stat() {
        let raw = r#"{"attempts": 1, "successes": 2}"#;
        assert!(serde_json::from_str::<PrincipleStat>(raw).is_err());
    }

    #[test]
    fn deserialization_dedupes_completed() {
        let raw = r#"{"completed": ["a", "b", "a"], "scores": {}}"#;
        let phase: PhaseProgress = serde_json::from_str(raw).unwrap();
        assert_eq!(phase.completed_count(), 2);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut progress = Progress::new(fixed_now());
        progress.record_recognition(&module(), &ScenarioId::new("s1"), "Ethos", false);
        progress.record_rated(
            &module(),
            Phase::Dialogue,
            &ScenarioId::new("s3"),
            4,
            &["Ethos".to_string()],
        );

        let json = serde_json::to_string(&progress).unwrap();
        let back: Progress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
    }
}
