//! Ordered step list editing
//!
//! A builder owns the steps of one pipeline field. Positions are the list
//! indices; ids come from a counter seeded above every loaded id. After each
//! successful mutation the builder rescans the list for a solvent-based step
//! and reports the result to the observer, if one is attached.

use std::fmt;

use reviewdex_core::codec::decode_list;
use serde_json::Value;
use tracing::{debug, warn};

use crate::classifier::{RoleSet, StepRole};
use crate::config::{DetailMode, PipelineConfig};
use crate::step::{Ingredient, PipelineStep, StepField, StepId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Which inputs a step shows, given its name and the pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleParams {
    pub mesh: bool,
    pub temperature: bool,
    pub pressure: bool,
    pub details: bool,
    pub ingredients: bool,
}

pub type SolventObserver = Box<dyn FnMut(bool)>;

pub struct PipelineBuilder {
    config: PipelineConfig,
    steps: Vec<PipelineStep>,
    prerequisites: Vec<Ingredient>,
    next_id: u64,
    observer: Option<SolventObserver>,
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("kind", &self.config.kind)
            .field("steps", &self.steps)
            .field("prerequisites", &self.prerequisites)
            .field("next_id", &self.next_id)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Next id from the counter. Once the counter is exhausted (a loaded id sat
/// at `u64::MAX`), the lowest id not in `taken` is reused.
fn allocate_id(next_id: &mut u64, taken: &[StepId]) -> StepId {
    if let Some(after) = next_id.checked_add(1) {
        let id = StepId(*next_id);
        *next_id = after;
        return id;
    }
    (1..=u64::MAX)
        .map(StepId)
        .find(|id| !taken.contains(id))
        .unwrap_or_default()
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_steps(config, Vec::new())
    }

    /// Adopt existing steps. Unassigned or duplicate ids get fresh ones.
    pub fn with_steps(config: PipelineConfig, mut steps: Vec<PipelineStep>) -> Self {
        let mut next_id = steps
            .iter()
            .map(|s| s.id.0)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let mut taken: Vec<StepId> = steps.iter().map(|s| s.id).collect();
        let mut seen = Vec::with_capacity(steps.len());
        for step in &mut steps {
            if !step.id.is_assigned() || seen.contains(&step.id) {
                step.id = allocate_id(&mut next_id, &taken);
                taken.push(step.id);
            }
            seen.push(step.id);
        }
        Self {
            config,
            steps,
            prerequisites: Vec::new(),
            next_id,
            observer: None,
        }
    }

    /// Load steps from a persisted field value (array or JSON-encoded array).
    /// Entries that are not step objects are skipped.
    pub fn from_value(config: PipelineConfig, value: Option<&Value>) -> Self {
        let steps = decode_list(value)
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<PipelineStep>(item) {
                Ok(step) => Some(step),
                Err(e) => {
                    warn!(kind = ?config.kind, error = %e, "skipping malformed pipeline step");
                    None
                }
            })
            .collect();
        Self::with_steps(config, steps)
    }

    /// Attach the solvent-flag observer
    #[must_use]
    pub fn on_solvent_change(mut self, observer: impl FnMut(bool) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: StepId) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Current position of a step
    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Replace the prerequisite list (cultivars, ingredients or upstream steps).
    /// Existing steps are kept even if the list becomes empty.
    pub fn set_prerequisites(&mut self, prerequisites: Vec<Ingredient>) {
        self.prerequisites = prerequisites;
    }

    pub fn prerequisites(&self) -> &[Ingredient] {
        &self.prerequisites
    }

    pub fn is_open(&self) -> bool {
        self.config.gate.is_open(self.prerequisites.len())
    }

    /// Append a step. `None` when the gate is closed or the name is blank.
    pub fn add_step(&mut self, name: &str) -> Option<StepId> {
        let name = name.trim();
        if name.is_empty() {
            debug!(kind = ?self.config.kind, "blank step name ignored");
            return None;
        }
        if !self.is_open() {
            debug!(kind = ?self.config.kind, gate = ?self.config.gate, "add_step gated");
            return None;
        }

        let taken: Vec<StepId> = self.steps.iter().map(|s| s.id).collect();
        let id = allocate_id(&mut self.next_id, &taken);
        self.steps.push(PipelineStep::new(id, name));
        self.notify();
        Some(id)
    }

    /// Update one field of a step in place. `false` if the step is unknown or
    /// the value does not coerce.
    pub fn update_step(&mut self, id: StepId, field: StepField, value: &Value) -> bool {
        if field == StepField::Ingredients && !self.config.associates_ingredients {
            debug!(step = %id, kind = ?self.config.kind, "pipeline has no ingredient links");
            return false;
        }
        let Some(step) = self.steps.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if !step.apply(&field, value) {
            debug!(step = %id, field = ?field, "update rejected");
            return false;
        }
        self.notify();
        true
    }

    pub fn remove_step(&mut self, id: StepId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.steps.remove(pos);
        self.notify();
        true
    }

    /// Swap with the neighbour in `direction`; no-op at either end
    pub fn move_step(&mut self, id: StepId, direction: Direction) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let target = match direction {
            Direction::Up if pos > 0 => pos - 1,
            Direction::Down if pos + 1 < self.steps.len() => pos + 1,
            _ => return false,
        };
        self.steps.swap(pos, target);
        self.notify();
        true
    }

    /// Add or remove an association by identity
    pub fn toggle_ingredient(&mut self, step_id: StepId, ingredient_id: &str) -> bool {
        if !self.config.associates_ingredients {
            return false;
        }
        if !self.prerequisites.iter().any(|i| i.id == ingredient_id) {
            debug!(step = %step_id, ingredient = ingredient_id, "unknown ingredient");
            return false;
        }
        let Some(step) = self.steps.iter_mut().find(|s| s.id == step_id) else {
            return false;
        };
        match step.ingredients.iter().position(|i| i == ingredient_id) {
            Some(pos) => {
                step.ingredients.remove(pos);
            }
            None => step.ingredients.push(ingredient_id.to_string()),
        }
        self.notify();
        true
    }

    /// Roles of a step that this pipeline shows parameters for
    pub fn visible_roles(&self, id: StepId) -> Option<RoleSet> {
        self.step(id)
            .map(|s| s.roles().intersect(self.config.relevant_roles))
    }

    /// Inputs to show for a step. Values of hidden inputs stay stored.
    pub fn visible_params(&self, id: StepId) -> Option<VisibleParams> {
        let roles = self.visible_roles(id)?;
        let params = match self.config.detail_mode {
            DetailMode::FreeText => VisibleParams {
                details: true,
                ..Default::default()
            },
            DetailMode::Classified => VisibleParams {
                mesh: roles.exposes_mesh(),
                temperature: roles.exposes_temperature(),
                pressure: roles.exposes_pressure(),
                details: false,
                ingredients: false,
            },
        };
        Some(VisibleParams {
            ingredients: self.config.associates_ingredients,
            ..params
        })
    }

    /// True if any step's name classifies as solvent-based
    pub fn contains_solvent_step(&self) -> bool {
        self.steps
            .iter()
            .any(|s| s.roles().contains(StepRole::SolventBased))
    }

    /// Steps as prerequisites of a downstream pipeline
    pub fn as_prerequisites(&self) -> Vec<Ingredient> {
        self.steps
            .iter()
            .map(|s| Ingredient::new(s.id.to_string(), s.name.clone()))
            .collect()
    }

    /// Persisted field value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.steps).unwrap_or_else(|e| {
            warn!(error = %e, "failed to serialize pipeline steps");
            Value::Array(Vec::new())
        })
    }

    pub fn into_steps(self) -> Vec<PipelineStep> {
        self.steps
    }

    fn notify(&mut self) {
        let flag = self.contains_solvent_step();
        if let Some(observer) = self.observer.as_mut() {
            observer(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn open_extraction() -> PipelineBuilder {
        let mut builder = PipelineBuilder::new(PipelineConfig::extraction());
        builder.set_prerequisites(vec![Ingredient::new("c1", "Gelato"), Ingredient::new("c2", "Gelato")]);
        builder
    }

    fn names(builder: &PipelineBuilder) -> Vec<&str> {
        builder.steps().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_gated_add() {
        let mut builder = PipelineBuilder::new(PipelineConfig::separation());
        assert_eq!(builder.add_step("Tamisage WPFF"), None);
        assert!(builder.is_empty());

        builder.set_prerequisites(vec![Ingredient::new("c1", "Gelato")]);
        assert!(builder.add_step("Tamisage WPFF").is_some());

        // emptying the gate later keeps existing steps
        builder.set_prerequisites(Vec::new());
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.add_step("Décantation"), None);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut builder = PipelineBuilder::new(PipelineConfig::fertilization());
        assert_eq!(builder.add_step("   "), None);
        assert!(builder.add_step("Compost").is_some());
    }

    #[test]
    fn test_move_boundaries() {
        let mut builder = PipelineBuilder::new(PipelineConfig::fertilization());
        let a = builder.add_step("A").unwrap();
        let b = builder.add_step("B").unwrap();
        let c = builder.add_step("C").unwrap();

        assert!(!builder.move_step(a, Direction::Up));
        assert!(!builder.move_step(c, Direction::Down));
        assert_eq!(names(&builder), vec!["A", "B", "C"]);

        assert!(builder.move_step(c, Direction::Up));
        assert_eq!(names(&builder), vec!["A", "C", "B"]);
        assert_eq!(builder.position(b), Some(2));

        assert!(builder.remove_step(a));
        assert_eq!(builder.position(c), Some(0));
        assert!(!builder.remove_step(a));
    }

    #[test]
    fn test_solvent_flag_emitted() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut builder = open_extraction().on_solvent_change(move |flag| sink.borrow_mut().push(flag));

        let bho = builder.add_step("Extraction au butane (BHO)").unwrap();
        builder.add_step("Tamisage WPFF").unwrap();
        assert!(builder.contains_solvent_step());

        builder.remove_step(bho);
        assert!(!builder.contains_solvent_step());
        assert_eq!(*seen.borrow(), vec![true, true, false]);
    }

    #[test]
    fn test_rename_reclassifies_and_hides_stale_params() {
        let mut builder = open_extraction();
        let id = builder.add_step("Pressage à chaud (Rosin)").unwrap();
        assert!(builder.update_step(id, StepField::Temperature, &json!("90")));

        let params = builder.visible_params(id).unwrap();
        assert!(params.mesh && params.temperature && !params.pressure);

        assert!(builder.update_step(id, StepField::Name, &json!("Extraction au butane (BHO)")));
        let params = builder.visible_params(id).unwrap();
        assert!(!params.mesh && !params.temperature);
        assert_eq!(builder.step(id).unwrap().temperature, Some(90.0));
    }

    #[test]
    fn test_toggle_by_identity() {
        let mut builder = open_extraction();
        let id = builder.add_step("Tamisage à sec (Dry)").unwrap();

        assert!(builder.toggle_ingredient(id, "c2"));
        assert_eq!(builder.step(id).unwrap().ingredients, vec!["c2"]);
        assert!(builder.toggle_ingredient(id, "c1"));
        assert!(builder.toggle_ingredient(id, "c2"));
        assert_eq!(builder.step(id).unwrap().ingredients, vec!["c1"]);

        assert!(!builder.toggle_ingredient(id, "Gelato"));
    }

    #[test]
    fn test_purification_shows_free_text() {
        let mut extraction = open_extraction();
        extraction.add_step("Extraction à l'éthanol (EHO)");

        let mut purification = PipelineBuilder::new(PipelineConfig::purification());
        assert_eq!(purification.add_step("Winterisation"), None);
        purification.set_prerequisites(extraction.as_prerequisites());
        let id = purification.add_step("Winterisation").unwrap();

        let params = purification.visible_params(id).unwrap();
        assert!(params.details && !params.mesh && !params.ingredients);
        assert!(purification.update_step(id, StepField::Details, &json!("-20°C, 48h")));
    }

    #[test]
    fn test_loaded_ids_seed_counter() {
        let value = json!("[{\"id\": 40, \"name\": \"A\"}, {\"name\": \"B\"}, 5, {\"id\": 40, \"name\": \"C\"}]");
        let mut builder = PipelineBuilder::from_value(PipelineConfig::fertilization(), Some(&value));

        let ids: Vec<u64> = builder.steps().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![40, 41, 42]);
        assert_eq!(builder.add_step("D"), Some(StepId(43)));
        assert_eq!(builder.to_value()[0], json!({"id": 40, "name": "A"}));
    }

    #[test]
    fn test_saved_keys_keep_identity_and_links() {
        let mut builder = PipelineBuilder::new(PipelineConfig::separation());
        builder.set_prerequisites(vec![Ingredient::new("c1", "Gelato")]);
        let id = builder.add_step("Tamisage WPFF").unwrap();
        assert!(builder.toggle_ingredient(id, "c1"));

        assert!(!builder.update_step(id, StepField::from_key("cultivars"), &json!("oops")));
        assert!(!builder.update_step(id, StepField::from_key("id"), &json!(999)));

        let saved = builder.to_value();
        assert_eq!(saved, json!([{"id": id.0, "name": "Tamisage WPFF", "cultivars": ["c1"]}]));

        let reloaded = PipelineBuilder::from_value(PipelineConfig::separation(), Some(&saved));
        assert_eq!(reloaded.steps(), builder.steps());
        assert!(reloaded.step(id).unwrap().has_ingredient("c1"));
    }

    #[test]
    fn test_exhausted_counter_reuses_free_ids() {
        let value = json!([
            {"id": 18446744073709551615u64, "name": "A"},
            {"id": 1.5e30, "name": "B"},
            {"id": 1, "name": "C"}
        ]);
        let mut builder = PipelineBuilder::from_value(PipelineConfig::fertilization(), Some(&value));

        let ids: Vec<u64> = builder.steps().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![u64::MAX, 2, 1]);
        assert_eq!(builder.add_step("D"), Some(StepId(3)));
        assert_eq!(builder.add_step("E"), Some(StepId(4)));
        assert!(builder.remove_step(StepId(2)));
        assert_eq!(builder.add_step("F"), Some(StepId(2)));
    }
}
