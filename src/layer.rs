//! Construction layers and the terminal-layer condition

use serde::{Deserialize, Serialize};

/// Number of construction layers in every quadrant.
pub const LAYER_COUNT: usize = 4;

/// Index of the layer that carries collision and wear.
pub const TERMINAL_LAYER: usize = LAYER_COUNT - 1;

/// Display names, indexed by layer position. Metadata only.
pub const LAYER_NAMES: [&str; LAYER_COUNT] = ["base", "support", "structure", "surface"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub completed: bool,
}

pub fn layer_name(index: usize) -> Option<&'static str> {
    LAYER_NAMES.get(index).copied()
}

/// Condition of the terminal layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastLayerState {
    #[default]
    Complete,
    Damaged,
    Destroyed,
}

impl LastLayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LastLayerState::Complete => "complete",
            LastLayerState::Damaged => "damaged",
            LastLayerState::Destroyed => "destroyed",
        }
    }
}
