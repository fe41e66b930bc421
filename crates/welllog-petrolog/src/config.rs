//! Open-time options for Petrolog logs.

use serde::{Deserialize, Serialize};

/// Feet to metres.
pub const FEET_TO_METRES: f64 = 0.3048;

/// Default runaway guard for index generation.
pub const DEFAULT_INDEX_ITERATION_LIMIT: usize = 1_000_000;

/// Unit system of the synthesized depth index. Files always store feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthUnits {
    #[default]
    Imperial,
    Metric,
}

impl DepthUnits {
    /// Multiplier from stored feet to this unit system.
    pub fn factor(self) -> f64 {
        match self {
            Self::Imperial => 1.0,
            Self::Metric => FEET_TO_METRES,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Imperial => "ft",
            Self::Metric => "m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetrologConfig {
    pub depth_units: DepthUnits,
    /// Upper bound on generated index samples.
    pub index_iteration_limit: usize,
    /// Read and write the `.statistics` side-car.
    pub use_statistics_cache: bool,
}

impl Default for PetrologConfig {
    fn default() -> Self {
        Self {
            depth_units: DepthUnits::Imperial,
            index_iteration_limit: DEFAULT_INDEX_ITERATION_LIMIT,
            use_statistics_cache: true,
        }
    }
}

impl PetrologConfig {
    pub fn with_depth_units(mut self, units: DepthUnits) -> Self {
        self.depth_units = units;
        self
    }

    pub fn with_index_iteration_limit(mut self, limit: usize) -> Self {
        self.index_iteration_limit = limit;
        self
    }

    pub fn with_statistics_cache(mut self, enabled: bool) -> Self {
        self.use_statistics_cache = enabled;
        self
    }
}
