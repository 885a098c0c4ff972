//! Plain-text rendering for the terminal front end.

use std::fmt::Write as _;

use gym_core::model::{Catalog, Debrief, GradeReport};
use services::{
    ActiveScenario, Dashboard, RecognitionReveal, ReferenceSection, SaveStatus, ShellError,
    TurnOutcome,
};

pub const HELP: &str = "\
Commands:
  dash                         progress overview
  modules                      list modules
  reference [module]           principle reference library
  open <module> <1|2|3> [id]   open a scenario (next open one if no id)
  pick <option>                choose an answer (phase 1)
  submit                       check your answer (phase 1)
  write <text>                 get coaching on a response (phase 2)
  again                        discard the grade and write again (phase 2)
  say <text>                   speak in the conversation (phase 3)
  retry                        ask for the debrief again (phase 3)
  close                        close the open scenario
  quit";

pub fn dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::from("Progress\n");
    for module in &dashboard.modules {
        let _ = writeln!(
            out,
            "  {} ({}): {}/{} scenarios, {}%",
            module.name, module.id, module.completed, module.total, module.percent
        );
        for phase in &module.phases {
            let status = if phase.unlocked {
                format!("{}/{}", phase.completed, phase.total)
            } else {
                format!("locked, {} more to unlock", phase.remaining_to_unlock)
            };
            let _ = writeln!(out, "    {}: {status}", phase.phase);
        }
    }
    out.push_str("Principles\n");
    for principle in &dashboard.principles {
        let _ = writeln!(out, "  {:<24} {}", principle.name, principle.strength);
    }
    out.trim_end().to_owned()
}

pub fn modules(catalog: &Catalog) -> String {
    catalog
        .modules()
        .map(|m| format!("{}  {}: {}", m.id, m.name, m.theme))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn reference(sections: &[ReferenceSection]) -> String {
    if sections.is_empty() {
        return "No reference entries.".to_owned();
    }
    let mut out = String::new();
    for section in sections {
        let _ = writeln!(out, "{} ({})", section.name, section.module);
        for entry in &section.entries {
            let _ = writeln!(out, "  {} ({})", entry.name, entry.source);
            let _ = writeln!(out, "    {}", entry.definition);
            let _ = writeln!(out, "    How it works: {}", entry.mechanism);
            for (label, text) in [
                ("Example", &entry.example),
                ("Use when", &entry.use_when),
                ("Avoid when", &entry.dont_use_when),
            ] {
                if !text.is_empty() {
                    let _ = writeln!(out, "    {label}: {text}");
                }
            }
        }
        out.push('\n');
    }
    out.trim_end().to_owned()
}

pub fn opened(active: &ActiveScenario) -> String {
    match active {
        ActiveScenario::Recognition(drill) => {
            let scenario = drill.scenario();
            let mut out = format!("{}\n\n{}\n", scenario.title, scenario.prompt);
            for option in &scenario.options {
                let _ = writeln!(out, "  [{}] {}", option.id, option.text);
            }
            out.trim_end().to_owned()
        }
        ActiveScenario::Coaching(exercise) => {
            let scenario = exercise.scenario();
            format!(
                "{}\n\n{}\n\nTarget principles: {}",
                scenario.title,
                scenario.prompt,
                scenario.principles.join(", ")
            )
        }
        ActiveScenario::Dialogue(dialogue) => {
            let scenario = dialogue.scenario();
            format!(
                "{}\n\n{}\n\n{}: {}\n({} exchanges)",
                scenario.title,
                scenario.setup,
                scenario.character.name,
                scenario.opening,
                dialogue.max_exchanges()
            )
        }
    }
}

pub fn reveal(reveal: &RecognitionReveal) -> String {
    let verdict = if reveal.is_correct { "Correct." } else { "Not quite." };
    let mut out = format!(
        "{verdict} The answer was [{}] ({}).\n\n{}",
        reveal.correct_option.id, reveal.correct_option.principle, reveal.explanation
    );
    if let Some(spotlight) = &reveal.spotlight {
        let _ = write!(out, "\n\nSpotlight on {}: {}", spotlight.principle, spotlight.text);
    }
    out
}

pub fn grade(report: &GradeReport) -> String {
    let mut out = format!("Rating {}/5: {}\n", report.rating, report.rating_justification);
    if !report.principles_detected.is_empty() {
        out.push_str("Principles detected:\n");
        for p in &report.principles_detected {
            let _ = writeln!(out, "  {}: {}", p.name, p.evidence);
        }
    }
    for item in &report.what_worked {
        let _ = writeln!(out, "  + {item}");
    }
    let growth = &report.growth_opportunity;
    let _ = write!(
        out,
        "Growth: {}\n  Why: {}\n  How: {}\n\nEnhanced version:\n{}",
        growth.issue, growth.why, growth.how, report.enhanced_version
    );
    out
}

pub fn turn(counterpart: &str, outcome: &TurnOutcome) -> String {
    let note = &outcome.note;
    let mut out = format!(
        "{counterpart}: {}\n  [coach] {} | {} | tip: {}",
        outcome.reply,
        note.principle_used.join(", "),
        note.effectiveness,
        note.tip
    );
    if let Some(debrief) = &outcome.debrief {
        out.push_str("\n\n");
        out.push_str(&self::debrief(debrief));
    }
    out
}

pub fn debrief(debrief: &Debrief) -> String {
    if debrief.is_degraded() {
        return format!(
            "{} {} (type `retry` to ask again)",
            debrief.best_moment, debrief.key_takeaway
        );
    }
    format!(
        "Debrief: {}/5\n  Principles used: {}\n  Best moment: {}\n  Missed: {}\n  Takeaway: {}",
        debrief.overall_rating,
        debrief.principles_used.join(", "),
        debrief.best_moment,
        debrief.missed_opportunity,
        debrief.key_takeaway
    )
}

pub fn error(err: &ShellError) -> String {
    let retry = match err {
        ShellError::Coaching(e) => e.is_retryable(),
        ShellError::Dialogue(e) => e.is_retryable(),
        _ => false,
    };
    if retry {
        format!("{err} (you can try again)")
    } else {
        err.to_string()
    }
}

pub fn save_notice(status: SaveStatus) -> Option<&'static str> {
    match status {
        SaveStatus::Saved => Some("(progress saved)"),
        SaveStatus::Failed => Some("(progress could not be saved; it is kept for this session)"),
        SaveStatus::Idle => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_core::model::{CoachingNote, ModuleId, PrincipleReference};

    fn entry(name: &str, use_when: &str) -> PrincipleReference {
        PrincipleReference {
            module: ModuleId::new("module-1"),
            name: name.into(),
            source: "Cialdini".into(),
            definition: format!("{name} defined."),
            mechanism: "Lowers resistance.".into(),
            example: String::new(),
            use_when: use_when.into(),
            dont_use_when: "They feel handled.".into(),
        }
    }

    #[test]
    fn reference_lists_guidance_under_its_module() {
        let sections = [ReferenceSection {
            module: ModuleId::new("module-1"),
            name: "Building Trust".into(),
            entries: vec![entry("Liking", "Rapport is thin."), entry("Unity", "")],
        }];

        let text = reference(&sections);
        assert!(text.starts_with("Building Trust (module-1)\n  Liking (Cialdini)"));
        assert!(text.contains("    Liking defined."));
        assert!(text.contains("Use when: Rapport is thin."));
        assert!(text.contains("Avoid when: They feel handled."));
        // blank optional fields are omitted
        assert!(!text.contains("Example:"));
        assert_eq!(text.matches("Use when").count(), 1);
    }

    #[test]
    fn empty_reference_says_so() {
        assert_eq!(reference(&[]), "No reference entries.");
    }

    #[test]
    fn degraded_debrief_offers_retry() {
        let text = debrief(&Debrief::degraded());
        assert!(text.starts_with("Debrief unavailable."));
        assert!(text.contains("retry"));
    }

    #[test]
    fn turn_shows_reply_and_note() {
        let outcome = TurnOutcome {
            reply: "Go on.".into(),
            note: CoachingNote::unavailable(),
            debrief: None,
        };
        let text = turn("Rep. Webb", &outcome);
        assert!(text.starts_with("Rep. Webb: Go on."));
        assert!(text.contains("Analysis unavailable"));
    }

    #[test]
    fn idle_status_is_silent() {
        assert_eq!(save_notice(SaveStatus::Idle), None);
        assert!(save_notice(SaveStatus::Failed).is_some());
    }
}
