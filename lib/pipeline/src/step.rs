//! Pipeline step model and its persisted shape
//!
//! Steps are stored as plain JSON objects inside the parent record field:
//! `{"id", "name", "mesh": "min–max", "tempC", "pressureBar", "details",
//! "cultivars": [...]}` plus any free-form keys (fertilization dose, phase...).
//! Loading is lenient: numeric strings are accepted wherever numbers are.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use reviewdex_core::codec::{decode_list, decode_number};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::classifier::{classify, RoleSet};

/// Creation-ordered step identifier; 0 means "not assigned yet"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(pub u64);

impl StepId {
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(id: u64) -> Self {
        StepId(id)
    }
}

impl Serialize for StepId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let id = match &value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Ok(StepId(id.unwrap_or(0)))
    }
}

static MESH_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)?\s*[–-]\s*(\d+)?\s*$").expect("Failed to compile mesh range regex")
});

static MESH_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*$").expect("Failed to compile mesh value regex"));

/// Sieve mesh range in microns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl MeshRange {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Parse `"min–max"` (en dash or hyphen), `"min–"`, `"–max"`, or a lone
    /// number taken as the max
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(caps) = MESH_RANGE.captures(raw) {
            let min = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let max = caps.get(2).and_then(|m| m.as_str().parse().ok());
            return Some(Self { min, max }).filter(|r| !r.is_empty());
        }
        MESH_SINGLE
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .map(|max| Self { min: None, max: Some(max) })
    }

    /// Decode any persisted shape: string, bare number, or `{min, max}` object
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(_) => decode_number(value).map(|max| Self {
                min: None,
                max: Some(max as u32),
            }),
            Value::Object(map) => {
                let bound = |key: &str| map.get(key).and_then(decode_number).map(|f| f as u32);
                Some(Self {
                    min: bound("min"),
                    max: bound("max"),
                })
                .filter(|r| !r.is_empty())
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for MeshRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{}–{}", min, max),
            (Some(min), None) => write!(f, "{}–", min),
            (None, Some(max)) => write!(f, "{}", max),
            (None, None) => Ok(()),
        }
    }
}

impl Serialize for MeshRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn lenient_mesh<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MeshRange>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(MeshRange::from_value(&value))
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(decode_number(&value))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_identities<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(decode_list(Some(&value))
        .iter()
        .filter_map(identity_of)
        .collect())
}

/// Stable identity of a list entry: the entry itself, or its `id`, or its `name`
pub fn identity_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("id")
            .and_then(identity_of)
            .or_else(|| map.get("name").and_then(identity_of)),
        _ => None,
    }
}

/// Something a step can be associated with: a cultivar, an ingredient, an
/// upstream step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
}

impl Ingredient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let id = identity_of(value)?;
        let name = match value {
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| id.clone()),
            _ => id.clone(),
        };
        Some(Self { id, name })
    }

    /// Decode a persisted list (array, JSON-encoded array, or nothing)
    pub fn list_from(value: Option<&Value>) -> Vec<Self> {
        decode_list(value).iter().filter_map(Self::from_value).collect()
    }
}

/// One step of a pipeline. Its position is its index in the owning list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    #[serde(default)]
    pub id: StepId,

    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_mesh")]
    pub mesh: Option<MeshRange>,

    #[serde(
        default,
        rename = "tempC",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_number"
    )]
    pub temperature: Option<f64>,

    #[serde(
        default,
        rename = "pressureBar",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_number"
    )]
    pub pressure: Option<f64>,

    /// Free-text detail (purification pipelines)
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub details: Option<String>,

    /// Identities of associated ingredients or cultivars
    #[serde(
        default,
        rename = "cultivars",
        alias = "ingredients",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "lenient_identities"
    )]
    pub ingredients: Vec<String>,

    /// Free-form keys (dose, phase, frequency, npk...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

impl PipelineStep {
    /// Keys the struct serializes itself; free-form extras may not shadow them
    pub const RESERVED_KEYS: &'static [&'static str] =
        &["id", "name", "mesh", "tempC", "pressureBar", "details", "cultivars", "ingredients"];

    pub fn new(id: StepId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Roles derived from the current name
    pub fn roles(&self) -> RoleSet {
        classify(&self.name)
    }

    pub fn has_ingredient(&self, id: &str) -> bool {
        self.ingredients.iter().any(|i| i == id)
    }
}

/// Addressable part of a step for [`update_step`](crate::PipelineBuilder::update_step)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepField {
    Name,
    /// Whole range as text, e.g. `"45–120"`
    Mesh,
    MeshMin,
    MeshMax,
    Temperature,
    Pressure,
    Details,
    /// Associated ingredient identities, replaced as a whole
    Ingredients,
    /// Any free-form key outside [`PipelineStep::RESERVED_KEYS`]
    Extra(String),
}

impl StepField {
    /// Map a persisted key onto a field
    pub fn from_key(key: &str) -> Self {
        match key {
            "name" => StepField::Name,
            "mesh" => StepField::Mesh,
            "meshMin" => StepField::MeshMin,
            "meshMax" => StepField::MeshMax,
            "tempC" | "temperature" => StepField::Temperature,
            "pressureBar" | "pressure" => StepField::Pressure,
            "details" => StepField::Details,
            "cultivars" | "ingredients" => StepField::Ingredients,
            other => StepField::Extra(other.to_string()),
        }
    }
}

/// Empty or blank input clears a field
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl PipelineStep {
    /// Apply an update with type coercion only. Returns `false` when the
    /// value cannot be coerced to the field's type; the step is left as is.
    pub fn apply(&mut self, field: &StepField, value: &Value) -> bool {
        match field {
            StepField::Name => match value {
                Value::String(s) => {
                    self.name = s.clone();
                    true
                }
                Value::Number(n) => {
                    self.name = n.to_string();
                    true
                }
                _ => false,
            },
            StepField::Mesh => {
                if is_blank(value) {
                    self.mesh = None;
                    return true;
                }
                match MeshRange::from_value(value) {
                    Some(range) => {
                        self.mesh = Some(range);
                        true
                    }
                    None => false,
                }
            }
            StepField::MeshMin | StepField::MeshMax => {
                let bound = if is_blank(value) {
                    None
                } else {
                    match decode_number(value) {
                        Some(n) if n >= 0.0 => Some(n as u32),
                        _ => return false,
                    }
                };
                let mut range = self.mesh.unwrap_or_default();
                if *field == StepField::MeshMin {
                    range.min = bound;
                } else {
                    range.max = bound;
                }
                self.mesh = Some(range).filter(|r| !r.is_empty());
                true
            }
            StepField::Temperature | StepField::Pressure => {
                let number = if is_blank(value) {
                    None
                } else {
                    match decode_number(value) {
                        Some(n) => Some(n),
                        None => return false,
                    }
                };
                if *field == StepField::Temperature {
                    self.temperature = number;
                } else {
                    self.pressure = number;
                }
                true
            }
            StepField::Details => {
                self.details = match value {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    v if is_blank(v) => None,
                    _ => return false,
                };
                true
            }
            StepField::Ingredients => {
                let items = match value {
                    Value::Array(items) => items.clone(),
                    Value::String(s) if !s.trim().is_empty() => {
                        match serde_json::from_str::<Vec<Value>>(s) {
                            Ok(items) => items,
                            Err(_) => return false,
                        }
                    }
                    v if is_blank(v) => Vec::new(),
                    _ => return false,
                };
                let mut ids: Vec<String> = Vec::with_capacity(items.len());
                for id in items.iter().filter_map(identity_of) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                self.ingredients = ids;
                true
            }
            StepField::Extra(key) => {
                if Self::RESERVED_KEYS.contains(&key.as_str()) {
                    return false;
                }
                if is_blank(value) {
                    self.extra.remove(key);
                } else {
                    self.extra.insert(key.clone(), value.clone());
                }
                true
            }
        }
    }
}
