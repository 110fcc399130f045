use reviewdex_schema::{
    FERTILIZERS, PREPARATION_ACTIONS, PURIFICATION_METHODS, SEPARATION_TYPES,
    SOLVENTLESS_EXTRACTIONS, SOLVENT_EXTRACTIONS,
};
use serde::{Deserialize, Serialize};

use crate::classifier::{RoleSet, StepRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Fertilization,
    Extraction,
    Separation,
    Purification,
    Preparation,
}

impl PipelineKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "fertilization" | "fertilisation" => Some(PipelineKind::Fertilization),
            "extraction" => Some(PipelineKind::Extraction),
            "separation" | "séparation" => Some(PipelineKind::Separation),
            "purification" => Some(PipelineKind::Purification),
            "preparation" | "préparation" | "recipe" => Some(PipelineKind::Preparation),
            _ => None,
        }
    }
}

/// What a step shows besides its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailMode {
    /// Role-specific parameters from classification
    Classified,
    /// One free-text detail per step
    FreeText,
}

/// Precondition checked when adding a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Open,
    /// At least one cultivar selected
    Cultivars,
    /// At least one upstream extraction step
    ExtractionSteps,
    /// At least one recipe ingredient
    Ingredients,
}

impl Gate {
    pub fn is_open(self, prerequisites: usize) -> bool {
        self == Gate::Open || prerequisites > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub kind: PipelineKind,
    /// Suggested step names
    #[serde(default)]
    pub vocabulary: Vec<String>,
    /// Steps carry a set of associated prerequisite identities
    #[serde(default)]
    pub associates_ingredients: bool,
    /// Roles whose parameters this pipeline shows
    #[serde(default)]
    pub relevant_roles: RoleSet,
    pub detail_mode: DetailMode,
    pub gate: Gate,
}

fn vocabulary(lists: &[&[&str]]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for list in lists {
        for word in *list {
            if !words.iter().any(|w| w == word) {
                words.push(word.to_string());
            }
        }
    }
    words
}

impl PipelineConfig {
    pub fn for_kind(kind: PipelineKind) -> Self {
        match kind {
            PipelineKind::Fertilization => Self::fertilization(),
            PipelineKind::Extraction => Self::extraction(),
            PipelineKind::Separation => Self::separation(),
            PipelineKind::Purification => Self::purification(),
            PipelineKind::Preparation => Self::preparation(),
        }
    }

    pub fn fertilization() -> Self {
        Self {
            kind: PipelineKind::Fertilization,
            vocabulary: vocabulary(&[FERTILIZERS]),
            associates_ingredients: false,
            relevant_roles: RoleSet::EMPTY,
            detail_mode: DetailMode::Classified,
            gate: Gate::Open,
        }
    }

    pub fn extraction() -> Self {
        Self {
            kind: PipelineKind::Extraction,
            vocabulary: vocabulary(&[SOLVENT_EXTRACTIONS, SOLVENTLESS_EXTRACTIONS, SEPARATION_TYPES]),
            associates_ingredients: true,
            relevant_roles: RoleSet::all(),
            detail_mode: DetailMode::Classified,
            gate: Gate::Cultivars,
        }
    }

    pub fn separation() -> Self {
        Self {
            kind: PipelineKind::Separation,
            vocabulary: vocabulary(&[SEPARATION_TYPES]),
            associates_ingredients: true,
            relevant_roles: RoleSet::all(),
            detail_mode: DetailMode::Classified,
            gate: Gate::Cultivars,
        }
    }

    pub fn purification() -> Self {
        Self {
            kind: PipelineKind::Purification,
            vocabulary: vocabulary(&[PURIFICATION_METHODS]),
            associates_ingredients: false,
            relevant_roles: RoleSet::EMPTY.with(StepRole::SolventBased),
            detail_mode: DetailMode::FreeText,
            gate: Gate::ExtractionSteps,
        }
    }

    pub fn preparation() -> Self {
        Self {
            kind: PipelineKind::Preparation,
            vocabulary: vocabulary(&[PREPARATION_ACTIONS]),
            associates_ingredients: true,
            relevant_roles: RoleSet::EMPTY,
            detail_mode: DetailMode::Classified,
            gate: Gate::Ingredients,
        }
    }
}
