//! Scripted cell presets
//!
//! Presets go through the same public operations as any other requester:
//! layers are laid in order with a `Preset` context, then the terminal
//! condition is forced when one is given.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::{BuildError, ConfigError};
use crate::events::MaterialContext;
use crate::grid::ConstructionGrid;
use crate::layer::{LastLayerState, LAYER_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPreset {
    pub x: i32,
    pub z: i32,
    /// Number of layers that should stand, `0..=4`.
    pub layers: usize,
    #[serde(default)]
    pub state: Option<LastLayerState>,
}

impl CellPreset {
    pub fn new(x: i32, z: i32, layers: usize) -> Self {
        Self {
            x,
            z,
            layers,
            state: None,
        }
    }

    pub fn with_state(mut self, state: LastLayerState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn validate(&self, config: &GridConfig) -> Result<(), ConfigError> {
        if !config.contains(self.x, self.z) {
            return Err(ConfigError::Validation(format!(
                "preset at ({}, {}) is outside the grid",
                self.x, self.z
            )));
        }
        if self.layers > LAYER_COUNT {
            return Err(ConfigError::Validation(format!(
                "preset at ({}, {}) asks for {} layers, at most {LAYER_COUNT} exist",
                self.x, self.z, self.layers
            )));
        }
        Ok(())
    }

    /// Lays missing layers up to `layers`. Layers already standing are kept.
    pub fn apply(&self, grid: &mut ConstructionGrid) -> Result<(), BuildError> {
        for layer in 0..self.layers.min(LAYER_COUNT) {
            let standing = grid
                .get_quadrant(self.x, self.z)
                .ok_or(BuildError::InvalidCoordinates {
                    x: self.x,
                    z: self.z,
                })?
                .is_layer_completed(layer);
            if !standing {
                grid.try_build_layer(self.x, self.z, layer, MaterialContext::preset())?;
            }
        }
        if let Some(state) = self.state {
            grid.set_last_layer_state(self.x, self.z, state)?;
        }
        Ok(())
    }
}

pub fn apply_presets(grid: &mut ConstructionGrid, presets: &[CellPreset]) -> Result<(), BuildError> {
    for preset in presets {
        preset.apply(grid)?;
    }
    if !presets.is_empty() {
        info!("applied {} presets to grid '{}'", presets.len(), grid.name());
    }
    Ok(())
}
