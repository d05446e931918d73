//! Scenario registry.
//!
//! Scenarios are registered under string ids and injected into the
//! state machine at construction; there are no process-wide globals, so
//! tests get isolated registries for free.

use indexmap::IndexMap;
use silt_core::ScenarioConfig;
use tracing::{info, warn};

use crate::generator::EventGenerator;

/// Display metadata for a scenario.
#[derive(Clone, Debug)]
pub struct ScenarioMeta {
    /// Display name.
    pub name: &'static str,
    /// Tooltip / help text.
    pub description: &'static str,
    /// Organization category (`demo`, `sandbox`, `test`).
    pub category: &'static str,
    /// Required world width; 0 means any size works.
    pub required_width: u32,
    /// Required world height; 0 means any size works.
    pub required_height: u32,
}

/// A named recipe for initial cells and per-tick perturbations.
pub trait Scenario: Send + Sync {
    /// Display metadata.
    fn meta(&self) -> &ScenarioMeta;

    /// The config this scenario starts with.
    fn default_config(&self) -> ScenarioConfig;

    /// Whether a config variant belongs to this scenario.
    fn accepts(&self, config: &ScenarioConfig) -> bool;

    /// Build a generator for the given config. Callers pass a config
    /// this scenario [`accepts`](Self::accepts).
    fn create_generator(&self, config: &ScenarioConfig) -> Box<dyn EventGenerator>;
}

/// Registry of scenarios keyed by string id.
#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: IndexMap<String, Box<dyn Scenario>>,
}

impl ScenarioRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with every built-in scenario.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::scenarios::register_builtins(&mut registry);
        registry
    }

    /// Register a scenario. Re-registering an id replaces the previous
    /// entry with a warning.
    pub fn register(&mut self, id: impl Into<String>, scenario: Box<dyn Scenario>) {
        let id = id.into();
        if self.scenarios.contains_key(&id) {
            warn!(%id, "scenario already registered, overwriting");
        }
        info!(%id, name = scenario.meta().name, "registering scenario");
        self.scenarios.insert(id, scenario);
    }

    /// Look up a scenario by id.
    pub fn get(&self, id: &str) -> Option<&dyn Scenario> {
        self.scenarios.get(id).map(|s| &**s)
    }

    /// All registered ids, sorted alphabetically.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scenarios.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
