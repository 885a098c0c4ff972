use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ModuleId, ScenarioId};
use crate::model::phase::Phase;
use crate::model::progress::Progress;

/// Separator between a principle and its facet in option labels ("Ethos — Goodwill").
const FACET_SEPARATOR: &str = " — ";

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown module: {0}")]
    UnknownModule(ModuleId),

    #[error("unknown scenario {scenario} in {phase} of {module}")]
    UnknownScenario {
        module: ModuleId,
        phase: Phase,
        scenario: ScenarioId,
    },

    #[error("{phase} of {module} has no scenarios")]
    NoScenarios { module: ModuleId, phase: Phase },

    #[error("scenario {0} declares no correct option")]
    NoCorrectOption(ScenarioId),
}

//
// ─── PRINCIPLES ───────────────────────────────────────────────────────────────
//

/// Short principle description attached to a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleSummary {
    pub name: String,
    pub source: String,
    pub mechanism: String,
}

/// Full reference entry for a principle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleReference {
    pub module: ModuleId,
    pub name: String,
    pub source: String,
    pub definition: String,
    pub mechanism: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub use_when: String,
    #[serde(default)]
    pub dont_use_when: String,
}

/// A themed group of principles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub name: String,
    pub theme: String,
    pub principles: Vec<PrincipleSummary>,
}

//
// ─── SCENARIOS ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    /// Principle label, optionally with a facet ("Liking — Similarity").
    pub principle: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

impl AnswerOption {
    /// The principle name without its facet suffix.
    #[must_use]
    pub fn principle_key(&self) -> &str {
        self.principle
            .split(FACET_SEPARATOR)
            .next()
            .unwrap_or(&self.principle)
            .trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spotlight {
    pub principle: String,
    pub text: String,
}

/// Phase 1: pick the best response among fixed options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionScenario {
    pub id: ScenarioId,
    pub title: String,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
    pub explanation: String,
    #[serde(default)]
    pub spotlight: Option<Spotlight>,
}

impl RecognitionScenario {
    /// The option marked correct. Catalog data is expected to mark exactly one.
    #[must_use]
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.correct)
    }

    #[must_use]
    pub fn option(&self, id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// Phase 2: write a free-text response for coaching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingScenario {
    pub id: ScenarioId,
    pub title: String,
    pub prompt: String,
    pub principles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub traits: String,
}

/// Phase 3: a bounded conversation with a simulated counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueScenario {
    pub id: ScenarioId,
    pub title: String,
    pub setup: String,
    pub character: Character,
    pub opening: String,
    pub max_exchanges: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleScenarios {
    #[serde(default)]
    pub recognition: Vec<RecognitionScenario>,
    #[serde(default)]
    pub coaching: Vec<CoachingScenario>,
    #[serde(default)]
    pub dialogue: Vec<DialogueScenario>,
}

impl ModuleScenarios {
    fn ids(&self, phase: Phase) -> Vec<&ScenarioId> {
        match phase {
            Phase::Recognition => self.recognition.iter().map(|s| &s.id).collect(),
            Phase::Coaching => self.coaching.iter().map(|s| &s.id).collect(),
            Phase::Dialogue => self.dialogue.iter().map(|s| &s.id).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModuleEntry {
    #[serde(flatten)]
    info: ModuleInfo,
    #[serde(default)]
    scenarios: ModuleScenarios,
}

//
// ─── CATALOG ──────────────────────────────────────────────────────────────────
//

/// Read-only scenario and principle catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    modules: Vec<ModuleEntry>,
    #[serde(default)]
    reference: Vec<PrincipleReference>,
}

impl Catalog {
    /// Parse a catalog from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the document does not match the schema.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.iter().map(|m| &m.info)
    }

    #[must_use]
    pub fn reference(&self) -> &[PrincipleReference] {
        &self.reference
    }

    fn entry(&self, module: &ModuleId) -> Result<&ModuleEntry, CatalogError> {
        self.modules
            .iter()
            .find(|m| &m.info.id == module)
            .ok_or_else(|| CatalogError::UnknownModule(module.clone()))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::UnknownModule` if the module is not in the catalog.
    pub fn module(&self, module: &ModuleId) -> Result<&ModuleInfo, CatalogError> {
        self.entry(module).map(|m| &m.info)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::UnknownModule` if the module is not in the catalog.
    pub fn scenarios(&self, module: &ModuleId) -> Result<&ModuleScenarios, CatalogError> {
        self.entry(module).map(|m| &m.scenarios)
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the module or scenario is unknown.
    pub fn recognition(
        &self,
        module: &ModuleId,
        scenario: &ScenarioId,
    ) -> Result<&RecognitionScenario, CatalogError> {
        self.scenarios(module)?
            .recognition
            .iter()
            .find(|s| &s.id == scenario)
            .ok_or_else(|| unknown(module, Phase::Recognition, scenario))
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the module or scenario is unknown.
    pub fn coaching(
        &self,
        module: &ModuleId,
        scenario: &ScenarioId,
    ) -> Result<&CoachingScenario, CatalogError> {
        self.scenarios(module)?
            .coaching
            .iter()
            .find(|s| &s.id == scenario)
            .ok_or_else(|| unknown(module, Phase::Coaching, scenario))
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the module or scenario is unknown.
    pub fn dialogue(
        &self,
        module: &ModuleId,
        scenario: &ScenarioId,
    ) -> Result<&DialogueScenario, CatalogError> {
        self.scenarios(module)?
            .dialogue
            .iter()
            .find(|s| &s.id == scenario)
            .ok_or_else(|| unknown(module, Phase::Dialogue, scenario))
    }

    /// Number of scenarios in `module` across all phases (0 for unknown modules).
    #[must_use]
    pub fn scenario_count(&self, module: &ModuleId) -> usize {
        self.scenarios(module).map_or(0, |s| {
            s.recognition.len() + s.coaching.len() + s.dialogue.len()
        })
    }

    /// The first scenario of `phase` not yet completed, or the first one when
    /// everything has been done (replay).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the module is unknown or the phase is empty.
    pub fn next_open_scenario(
        &self,
        module: &ModuleId,
        phase: Phase,
        progress: &Progress,
    ) -> Result<ScenarioId, CatalogError> {
        let ids = self.scenarios(module)?.ids(phase);
        let first = ids.first().ok_or_else(|| CatalogError::NoScenarios {
            module: module.clone(),
            phase,
        })?;
        let open = ids
            .iter()
            .find(|id| !progress.is_completed(module, phase, id))
            .unwrap_or(first);
        Ok((*open).clone())
    }

    /// `"Name (Source): mechanism"` lines for the principles of a module.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownModule` if the module is not in the catalog.
    pub fn principle_definitions(&self, module: &ModuleId) -> Result<String, CatalogError> {
        let info = self.module(module)?;
        Ok(info
            .principles
            .iter()
            .map(|p| format!("{} ({}): {}", p.name, p.source, p.mechanism))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn unknown(module: &ModuleId, phase: Phase, scenario: &ScenarioId) -> CatalogError {
    CatalogError::UnknownScenario {
        module: module.clone(),
        phase,
        scenario: scenario.clone(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
