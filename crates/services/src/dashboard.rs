//! Read-only progress overview and principle reference listing.
//!
//! Presentation-agnostic: counts and classifications only, no formatted text.

use gym_core::model::{Catalog, ModuleId, Phase, PrincipleReference, Progress};
use gym_core::{Strength, classify, is_unlocked, remaining_to_unlock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOverview {
    pub phase: Phase,
    pub unlocked: bool,
    pub completed: usize,
    pub total: usize,
    /// Completions the previous phase still needs; zero once unlocked.
    pub remaining_to_unlock: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOverview {
    pub id: ModuleId,
    pub name: String,
    pub completed: usize,
    pub total: usize,
    /// Whole-number percentage, rounded down.
    pub percent: u8,
    pub phases: Vec<PhaseOverview>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrincipleOverview {
    pub name: String,
    pub strength: Strength,
    pub attempts: u32,
    pub avg_rating: Option<f64>,
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub modules: Vec<ModuleOverview>,
    pub principles: Vec<PrincipleOverview>,
}

impl Dashboard {
    #[must_use]
    pub fn build(catalog: &Catalog, progress: &Progress) -> Self {
        Self {
            modules: catalog
                .modules()
                .map(|info| module_overview(catalog, progress, &info.id, &info.name))
                .collect(),
            principles: principle_names(catalog)
                .into_iter()
                .map(|name| principle_overview(name, progress))
                .collect(),
        }
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&ModuleOverview> {
        self.modules.iter().find(|m| &m.id == id)
    }
}

fn module_overview(
    catalog: &Catalog,
    progress: &Progress,
    id: &ModuleId,
    name: &str,
) -> ModuleOverview {
    let phases: Vec<PhaseOverview> = Phase::ALL
        .iter()
        .map(|&phase| PhaseOverview {
            phase,
            unlocked: is_unlocked(id, phase, progress),
            completed: progress.completed_count(id, phase),
            total: catalog
                .scenarios(id)
                .map(|s| match phase {
                    Phase::Recognition => s.recognition.len(),
                    Phase::Coaching => s.coaching.len(),
                    Phase::Dialogue => s.dialogue.len(),
                })
                .unwrap_or(0),
            remaining_to_unlock: remaining_to_unlock(id, phase, progress),
        })
        .collect();
    let completed = phases.iter().map(|p| p.completed).sum();
    let total = catalog.scenario_count(id);
    ModuleOverview {
        id: id.clone(),
        name: name.to_owned(),
        completed,
        total,
        percent: percent(completed, total),
        phases,
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = completed.min(total) * 100 / total;
    u8::try_from(pct).unwrap_or(100)
}

/// Reference principles first, then module principles missing from the reference.
fn principle_names(catalog: &Catalog) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let reference = catalog.reference().iter().map(|p| p.name.as_str());
    let summaries = catalog
        .modules()
        .flat_map(|m| m.principles.iter().map(|p| p.name.as_str()));
    for name in reference.chain(summaries) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn principle_overview(name: &str, progress: &Progress) -> PrincipleOverview {
    let stat = progress.principle_stat(name);
    PrincipleOverview {
        name: name.to_owned(),
        strength: classify(name, progress),
        attempts: stat.map_or(0, |s| s.attempts()),
        avg_rating: stat.and_then(|s| s.avg_rating()),
        success_rate: stat.and_then(|s| s.success_rate()),
    }
}

//
// ─── REFERENCE LIBRARY ────────────────────────────────────────────────────────
//

/// Reference entries belonging to one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSection {
    pub module: ModuleId,
    pub name: String,
    pub entries: Vec<PrincipleReference>,
}

/// The principle reference library grouped by module.
///
/// Sections follow catalog module order and entries keep catalog order.
/// Modules without entries are left out; entries naming a module the catalog
/// does not define get a trailing section titled by the raw id.
#[must_use]
pub fn reference_library(catalog: &Catalog) -> Vec<ReferenceSection> {
    let mut sections: Vec<ReferenceSection> = catalog
        .modules()
        .map(|info| ReferenceSection {
            module: info.id.clone(),
            name: info.name.clone(),
            entries: Vec::new(),
        })
        .collect();
    for entry in catalog.reference() {
        match sections.iter_mut().find(|s| s.module == entry.module) {
            Some(section) => section.entries.push(entry.clone()),
            None => sections.push(ReferenceSection {
                module: entry.module.clone(),
                name: entry.module.to_string(),
                entries: vec![entry.clone()],
            }),
        }
    }
    sections.retain(|s| !s.entries.is_empty());
    sections
}
