//! Phase availability rules.
//!
//! Thresholds are fixed and independent of how many scenarios a module
//! actually ships: a module with fewer than three recognition scenarios can
//! never open its coaching phase.

use crate::model::{ModuleId, Phase, Progress};

/// Completions required in the previous phase before a phase opens.
pub const UNLOCK_THRESHOLD: usize = 3;

/// Whether `phase` of `module` is available for the given progress.
#[must_use]
pub fn is_unlocked(module: &ModuleId, phase: Phase, progress: &Progress) -> bool {
    remaining_to_unlock(module, phase, progress) == 0
}

/// How many more completions the previous phase needs before `phase` opens.
#[must_use]
pub fn remaining_to_unlock(module: &ModuleId, phase: Phase, progress: &Progress) -> usize {
    match phase.previous() {
        None => 0,
        Some(previous) => {
            UNLOCK_THRESHOLD.saturating_sub(progress.completed_count(module, previous))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScenarioId;
    use crate::time::fixed_now;

    fn complete_recognition(progress: &mut Progress, module: &ModuleId, n: usize) {
        for i in 0..n {
            progress.record_recognition(module, &ScenarioId::new(format!("r{i}")), "Ethos", true);
        }
    }

    #[test]
    fn recognition_is_always_open() {
        let progress = Progress::new(fixed_now());
        let module = ModuleId::new("module-9");
        assert!(is_unlocked(&module, Phase::Recognition, &progress));
        assert!(!is_unlocked(&module, Phase::Coaching, &progress));
        assert!(!is_unlocked(&module, Phase::Dialogue, &progress));
    }

    #[test]
    fn coaching_opens_at_three_recognition_completions() {
        let module = ModuleId::new("module-1");
        let mut progress = Progress::new(fixed_now());

        complete_recognition(&mut progress, &module, 2);
        assert!(!is_unlocked(&module, Phase::Coaching, &progress));
        assert_eq!(remaining_to_unlock(&module, Phase::Coaching, &progress), 1);

        complete_recognition(&mut progress, &module, 3);
        assert!(is_unlocked(&module, Phase::Coaching, &progress));
        assert!(!is_unlocked(&module, Phase::Dialogue, &progress));
    }

    #[test]
    fn dialogue_depends_only_on_coaching_completions() {
        let module = ModuleId::new("module-1");
        let mut progress = Progress::new(fixed_now());
        for i in 0..3 {
            progress.record_rated(
                &module,
                Phase::Coaching,
                &ScenarioId::new(format!("c{i}")),
                3,
                &[],
            );
        }
        assert!(is_unlocked(&module, Phase::Dialogue, &progress));
    }

    #[test]
    fn unlocks_stay_unlocked_under_further_completions() {
        let module = ModuleId::new("module-1");
        let mut progress = Progress::new(fixed_now());
        let mut was_unlocked = false;
        for i in 0..8 {
            // replays interleaved with new completions
            let id = ScenarioId::new(format!("r{}", i / 2));
            progress.record_recognition(&module, &id, "Liking", i % 3 == 0);
            let now_unlocked = is_unlocked(&module, Phase::Coaching, &progress);
            assert!(!was_unlocked || now_unlocked);
            was_unlocked = now_unlocked;
        }
        assert!(was_unlocked);
    }
}
