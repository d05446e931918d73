//! The empty scenario: a blank world.

use silt_core::ScenarioConfig;

use crate::generator::{EventGenerator, NullGenerator};
use crate::registry::{Scenario, ScenarioMeta};

/// No features, no perturbation. Worlds start on this scenario until
/// another is applied.
pub struct EmptyScenario {
    meta: ScenarioMeta,
}

impl EmptyScenario {
    /// Construct the scenario.
    pub fn new() -> Self {
        Self {
            meta: ScenarioMeta {
                name: "Empty",
                description: "A blank world",
                category: "test",
                required_width: 0,
                required_height: 0,
            },
        }
    }
}

impl Default for EmptyScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for EmptyScenario {
    fn meta(&self) -> &ScenarioMeta {
        &self.meta
    }

    fn default_config(&self) -> ScenarioConfig {
        ScenarioConfig::Empty
    }

    fn accepts(&self, config: &ScenarioConfig) -> bool {
        matches!(config, ScenarioConfig::Empty)
    }

    fn create_generator(&self, _config: &ScenarioConfig) -> Box<dyn EventGenerator> {
        Box::new(NullGenerator)
    }
}
