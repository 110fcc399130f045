//! Step Classification Module
//!
//! Maps a free-text step name to the set of roles it plays. Classification is
//! a pure function of the name: nothing is stored on the step, so renaming a
//! step re-classifies it on the next read.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A role a step plays, each exposing its own parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    /// Sieving and washing: min/max mesh in microns
    MeshBased,
    /// Rosin and other hot presses: mesh range and temperature
    ThermalPress,
    /// CO2 supercritical extraction: pressure and temperature
    Supercritical,
    /// Solvent extraction: no step-local parameters, raises the pipeline solvent flag
    SolventBased,
}

impl StepRole {
    pub const ALL: [StepRole; 4] = [
        StepRole::MeshBased,
        StepRole::ThermalPress,
        StepRole::Supercritical,
        StepRole::SolventBased,
    ];

    const fn bit(self) -> u8 {
        match self {
            StepRole::MeshBased => 1,
            StepRole::ThermalPress => 1 << 1,
            StepRole::Supercritical => 1 << 2,
            StepRole::SolventBased => 1 << 3,
        }
    }

    pub fn exposes_mesh(self) -> bool {
        matches!(self, StepRole::MeshBased | StepRole::ThermalPress)
    }

    pub fn exposes_temperature(self) -> bool {
        matches!(self, StepRole::ThermalPress | StepRole::Supercritical)
    }

    pub fn exposes_pressure(self) -> bool {
        matches!(self, StepRole::Supercritical)
    }
}

/// Set of [`StepRole`]s, stored as a bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub const fn all() -> Self {
        RoleSet(0b1111)
    }

    #[must_use]
    pub const fn with(self, role: StepRole) -> Self {
        RoleSet(self.0 | role.bit())
    }

    pub const fn contains(self, role: StepRole) -> bool {
        self.0 & role.bit() != 0
    }

    #[must_use]
    pub const fn intersect(self, other: RoleSet) -> Self {
        RoleSet(self.0 & other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = StepRole> {
        StepRole::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    pub fn exposes_mesh(self) -> bool {
        self.iter().any(StepRole::exposes_mesh)
    }

    pub fn exposes_temperature(self) -> bool {
        self.iter().any(StepRole::exposes_temperature)
    }

    pub fn exposes_pressure(self) -> bool {
        self.iter().any(StepRole::exposes_pressure)
    }
}

impl FromIterator<StepRole> for RoleSet {
    fn from_iter<I: IntoIterator<Item = StepRole>>(iter: I) -> Self {
        iter.into_iter().fold(RoleSet::EMPTY, RoleSet::with)
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<StepRole>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

// ============================================================================
// Vocabulary Patterns
// ============================================================================

/// Sieving vocabulary: "Tamisage à sec", "Bubble Hash", "Ice Dry", "WPFF"
static MESH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        tamis
        | bubble
        | ice\s*hash
        | ice\s*dry
        | dry\s*sift
        | sieve
        | wpff
        | whole\s*plant\s*fresh\s*frozen
        ",
    )
    .expect("Failed to compile mesh pattern regex")
});

/// Hot-press vocabulary: "Pressage à chaud (Rosin)", "heat press"
static THERMAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        rosin
        | press(?:age)?\s*(?:à|a)\s*chaud
        | (?:hot|heat)\s*press
        ",
    )
    .expect("Failed to compile thermal press pattern regex")
});

/// CO2 together with supercritical, in either order
static SUPERCRITICAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:co2|co₂).*supercriti|supercriti.*(?:co2|co₂)")
        .expect("Failed to compile supercritical pattern regex")
});

/// Chemical solvents and oil infusions
static SOLVENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        [ée]thanol
        | \beho\b
        | isopropyl
        | \bipa\b
        | ac[ée]tone
        | butane
        | propane
        | hexane
        | huiles?\s*v[ée]g[ée]tales?
        | vegetable\s*oil
        | \bcoco(?:nut)?\b
        | \bolive\b
        ",
    )
    .expect("Failed to compile solvent pattern regex")
});

/// Every role whose vocabulary appears in `name`
pub fn classify(name: &str) -> RoleSet {
    let mut roles = RoleSet::EMPTY;
    if MESH_PATTERN.is_match(name) {
        roles = roles.with(StepRole::MeshBased);
    }
    if THERMAL_PATTERN.is_match(name) {
        roles = roles.with(StepRole::ThermalPress);
    }
    if SUPERCRITICAL_PATTERN.is_match(name) {
        roles = roles.with(StepRole::Supercritical);
    }
    if SOLVENT_PATTERN.is_match(name) {
        roles = roles.with(StepRole::SolventBased);
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_vocabulary() {
        for name in [
            "Tamisage WPFF (Whole Plant Fresh Frozen)",
            "Tamisage à l'eau glacée (Bubble Hash)",
            "ICE HASH",
            "dry sift",
        ] {
            let roles = classify(name);
            assert!(roles.contains(StepRole::MeshBased), "{}", name);
            assert!(!roles.contains(StepRole::SolventBased), "{}", name);
        }
    }

    #[test]
    fn test_thermal_press() {
        let roles = classify("Pressage à chaud (Rosin)");
        assert!(roles.contains(StepRole::ThermalPress));
        assert!(roles.exposes_mesh());
        assert!(roles.exposes_temperature());
        assert!(!roles.exposes_pressure());
        assert!(classify("pressage a chaud").contains(StepRole::ThermalPress));
    }

    #[test]
    fn test_supercritical() {
        let roles = classify("Extraction au CO₂ supercritique");
        assert!(roles.contains(StepRole::Supercritical));
        assert!(roles.exposes_pressure());
        assert!(roles.exposes_temperature());
        assert!(classify("Supercritical CO2").contains(StepRole::Supercritical));
        assert!(!classify("CO2 tank").contains(StepRole::Supercritical));
    }

    #[test]
    fn test_solvents() {
        for name in [
            "Extraction à l'éthanol (EHO)",
            "Extraction à l'alcool isopropylique (IPA)",
            "Extraction à l'acétone (AHO)",
            "Extraction au butane (BHO)",
            "Extraction a l'isobutane (IHO)",
            "Extraction au propane (PHO)",
            "Extraction à l'hexane (HHO)",
            "Extraction aux huiles végétales (coco, olive)",
        ] {
            assert!(classify(name).contains(StepRole::SolventBased), "{}", name);
        }
        assert!(!classify("Chocolat").contains(StepRole::SolventBased));
    }

    #[test]
    fn test_unclassified_and_multi_role() {
        assert!(classify("Séchage").is_empty());
        assert!(classify("").is_empty());

        let roles = classify("Bubble hash puis rosin");
        assert!(roles.contains(StepRole::MeshBased));
        assert!(roles.contains(StepRole::ThermalPress));
        assert_eq!(roles.iter().count(), 2);
    }

    #[test]
    fn test_role_set_ops() {
        let set: RoleSet = [StepRole::MeshBased, StepRole::SolventBased].into_iter().collect();
        let relevant = RoleSet::EMPTY.with(StepRole::SolventBased);
        assert_eq!(set.intersect(relevant), relevant);
        assert_eq!(RoleSet::all().iter().count(), 4);

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["mesh_based","solvent_based"]"#);
        let back: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
