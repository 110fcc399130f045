//! Review schema definitions
//!
//! Static, load-once description of each product kind: ordered sections of
//! typed fields, plus the category map that feeds rating aggregation.

use std::fs;
use std::path::Path;

use ahash::AHashSet;
use once_cell::sync::Lazy;
use reviewdex_core::codec::{decode_list, decode_number, decode_object};
use reviewdex_core::{normalize_key, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// The four product kinds a review can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    #[serde(rename = "Fleur", alias = "flower")]
    Flower,
    #[serde(rename = "Hash", alias = "hash")]
    Hash,
    #[serde(rename = "Concentré", alias = "concentrate")]
    Concentrate,
    #[serde(rename = "Comestible", alias = "edible")]
    Edible,
}

impl ProductKind {
    pub const ALL: [ProductKind; 4] = [
        ProductKind::Flower,
        ProductKind::Hash,
        ProductKind::Concentrate,
        ProductKind::Edible,
    ];

    /// Parse a stored label or an English alias, ignoring case and accents
    pub fn parse(label: &str) -> Option<Self> {
        match normalize_key(label).as_str() {
            "fleur" | "flower" | "fleurs" | "flowers" => Some(ProductKind::Flower),
            "hash" => Some(ProductKind::Hash),
            "concentre" | "concentrate" | "concentres" | "concentrates" => {
                Some(ProductKind::Concentrate)
            }
            "comestible" | "edible" | "comestibles" | "edibles" => Some(ProductKind::Edible),
            _ => None,
        }
    }

    /// Label as stored in the record's `type` field
    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Flower => "Fleur",
            ProductKind::Hash => "Hash",
            ProductKind::Concentrate => "Concentré",
            ProductKind::Edible => "Comestible",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Field type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    /// Bounded numeric rating input
    Slider,
    Select,
    Multiselect,
    Checkbox,
    /// Ordered list of steps
    Pipeline,
    /// Ingredients plus preparation steps
    Recipe,
    Images,
}

/// One field of a section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    pub key: String,
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Upper bound for sliders and numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default)]
    pub required: bool,

    /// Field holding the prerequisite list of a pipeline (e.g. the cultivar list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FieldConfig {
    fn base(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            max: None,
            choices: Vec::new(),
            default: None,
            required: false,
            source: None,
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::base(key, label, FieldType::Text)
    }

    pub fn textarea(key: &str, label: &str) -> Self {
        Self::base(key, label, FieldType::Textarea)
    }

    pub fn number(key: &str, label: &str, max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::base(key, label, FieldType::Number)
        }
    }

    pub fn slider(key: &str, label: &str, max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::base(key, label, FieldType::Slider)
        }
    }

    pub fn select(key: &str, label: &str, choices: &[&str]) -> Self {
        Self {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            ..Self::base(key, label, FieldType::Select)
        }
    }

    pub fn multiselect(key: &str, label: &str, choices: &[&str]) -> Self {
        Self {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            ..Self::base(key, label, FieldType::Multiselect)
        }
    }

    pub fn checkbox(key: &str, label: &str) -> Self {
        Self::base(key, label, FieldType::Checkbox)
    }

    pub fn pipeline(key: &str, label: &str, choices: &[&str], source: Option<&str>) -> Self {
        Self {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            source: source.map(str::to_string),
            ..Self::base(key, label, FieldType::Pipeline)
        }
    }

    pub fn recipe(key: &str, label: &str) -> Self {
        Self::base(key, label, FieldType::Recipe)
    }

    pub fn images(key: &str, label: &str) -> Self {
        Self::base(key, label, FieldType::Images)
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn default_number(&self) -> f64 {
        self.default.as_ref().and_then(decode_number).unwrap_or(0.0)
    }

    /// Value a field takes when nothing usable was stored
    pub fn empty_value(&self) -> Value {
        match self.field_type {
            FieldType::Text | FieldType::Textarea | FieldType::Select => {
                self.default.clone().unwrap_or_else(|| Value::String(String::new()))
            }
            FieldType::Number | FieldType::Slider => Value::from(self.default_number()),
            FieldType::Checkbox => {
                Value::Bool(self.default.as_ref().and_then(Value::as_bool).unwrap_or(false))
            }
            FieldType::Multiselect | FieldType::Pipeline | FieldType::Images => {
                Value::Array(Vec::new())
            }
            FieldType::Recipe => Value::Object(Default::default()),
        }
    }

    /// Slider reading: absent, null, empty or non-numeric falls back to the default (or 0)
    pub fn slider_value(&self, raw: Option<&Value>) -> f64 {
        raw.and_then(decode_number)
            .unwrap_or_else(|| self.default_number())
    }

    /// Decode a stored value into the shape this field type expects
    pub fn normalize_value(&self, raw: Option<&Value>) -> Value {
        match self.field_type {
            FieldType::Text | FieldType::Textarea | FieldType::Select => match raw {
                Some(Value::String(s)) => Value::String(s.clone()),
                Some(Value::Number(n)) => Value::String(n.to_string()),
                Some(Value::Bool(b)) => Value::String(b.to_string()),
                _ => self.empty_value(),
            },
            FieldType::Number => raw
                .and_then(decode_number)
                .map(Value::from)
                .unwrap_or_else(|| self.empty_value()),
            FieldType::Slider => Value::from(self.slider_value(raw)),
            FieldType::Checkbox => match raw {
                Some(Value::Bool(b)) => Value::Bool(*b),
                Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
                Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
                Some(Value::Number(n)) => Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
                _ => self.empty_value(),
            },
            FieldType::Multiselect | FieldType::Pipeline | FieldType::Images => {
                Value::Array(decode_list(raw))
            }
            FieldType::Recipe => Value::Object(decode_object(raw)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub title: String,
    pub fields: Vec<FieldConfig>,
}

impl Section {
    pub fn new(title: &str, fields: Vec<FieldConfig>) -> Self {
        Self {
            title: title.to_string(),
            fields,
        }
    }
}

/// A rating category and the field keys feeding it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub fields: Vec<String>,
}

impl Category {
    pub fn new(name: &str, label: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Full schema of one product kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSchema {
    pub kind: ProductKind,
    pub sections: Vec<Section>,
    /// Category map, in display order
    pub categories: Vec<Category>,
}

impl ProductSchema {
    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldConfig> {
        self.fields().find(|f| f.key == key)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Schemas for every product kind, with a designated fallback kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaCatalog {
    /// Kind used when a record's kind is unknown or has no schema
    #[serde(default = "default_kind")]
    pub default_kind: ProductKind,
    pub schemas: Vec<ProductSchema>,
}

fn default_kind() -> ProductKind {
    ProductKind::Flower
}

/// Last resort for catalogs built without validation
static BUILTIN: Lazy<SchemaCatalog> = Lazy::new(SchemaCatalog::builtin);

impl SchemaCatalog {
    pub fn new(schemas: Vec<ProductSchema>, default_kind: ProductKind) -> Self {
        Self {
            default_kind,
            schemas,
        }
    }

    /// Load and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let catalog: SchemaCatalog =
            serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a catalog file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let json = fs::read_to_string(path.as_ref())
            .map_err(|e| SchemaError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&json)
    }

    /// Check structural consistency: default kind present, unique field keys,
    /// non-empty categories, positive slider bounds
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.schemas.is_empty() {
            return Err(SchemaError::EmptyCatalog);
        }
        if !self.schemas.iter().any(|s| s.kind == self.default_kind) {
            return Err(SchemaError::MissingDefault(self.default_kind));
        }

        for schema in &self.schemas {
            let mut seen = AHashSet::new();
            for field in schema.fields() {
                if !seen.insert(field.key.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        kind: schema.kind,
                        key: field.key.clone(),
                    });
                }
                if field.field_type == FieldType::Slider && field.max.map_or(true, |m| m <= 0.0) {
                    return Err(SchemaError::InvalidSliderMax(field.key.clone()));
                }
            }
            for category in &schema.categories {
                if category.fields.is_empty() {
                    return Err(SchemaError::EmptyCategory {
                        kind: schema.kind,
                        category: category.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Schema for `kind`, falling back to the default kind's schema, then to
    /// the first schema. An empty catalog answers with the built-in schemas.
    pub fn get(&self, kind: ProductKind) -> &ProductSchema {
        let found = self
            .schemas
            .iter()
            .find(|s| s.kind == kind)
            .or_else(|| self.schemas.iter().find(|s| s.kind == self.default_kind))
            .or_else(|| self.schemas.first());
        match found {
            Some(schema) => schema,
            None => {
                warn!(kind = %kind, "empty schema catalog, using built-in schema");
                BUILTIN.get(kind)
            }
        }
    }

    /// Resolve a stored kind label; unknown or missing labels map to the default kind
    pub fn kind_of(&self, label: Option<&str>) -> ProductKind {
        label.and_then(ProductKind::parse).unwrap_or(self.default_kind)
    }

    pub fn schema_for(&self, record: &Record) -> &ProductSchema {
        self.get(self.kind_of(record.kind()))
    }

    /// Normalize every declared field the record carries into its typed shape.
    ///
    /// Fields the record does not carry are left absent: a missing slider must
    /// stay "no data" for rating purposes rather than becoming 0.
    pub fn normalize_record(&self, record: &Record) -> Record {
        let schema = self.schema_for(record);
        let mut normalized = record.clone();
        for field in schema.fields() {
            if let Some(raw) = record.get(&field.key) {
                normalized.insert(field.key.clone(), field.normalize_value(Some(raw)));
            }
        }
        normalized
    }
}

/// Errors that can occur during schema validation
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Catalog cannot be empty")]
    EmptyCatalog,

    #[error("Default kind '{0}' has no schema")]
    MissingDefault(ProductKind),

    #[error("Field '{key}' declared twice for {kind}")]
    DuplicateField { kind: ProductKind, key: String },

    #[error("Category '{category}' of {kind} has no fields")]
    EmptyCategory { kind: ProductKind, category: String },

    #[error("Slider '{0}' needs a positive max")]
    InvalidSliderMax(String),

    #[error("Catalog parse error: {0}")]
    Parse(String),

    #[error("Catalog read error: {0}")]
    Io(String),
}
