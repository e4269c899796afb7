//! Cooperative construction-site simulation
//!
//! A rectangular grid of quadrants, each built up through four ordered
//! layers and worn down by era-specific rules:
//! - `era`: per-era decay, impact and repair rules
//! - `quadrant`: the per-cell construction state machine
//! - `grid`: coordinate-indexed entry point for every collaborator
//! - `powerup` / `preset`: scripted effects routed through the grid API

pub mod config;
pub mod era;
pub mod error;
pub mod events;
pub mod grid;
pub mod layer;
pub mod powerup;
pub mod presentation;
pub mod preset;
pub mod quadrant;
pub mod rng;

pub use config::{ConfigLoader, EraTemplate, GridConfig};
pub use era::{EraVariant, ImpactOutcome};
pub use error::{BuildError, ConfigError};
pub use events::{AudioCue, GridEvent, GridObserver, MaterialContext};
pub use grid::{ConstructionGrid, GridBuilder, GridSnapshot, QuadrantMut};
pub use layer::{LastLayerState, LAYER_COUNT, TERMINAL_LAYER};
pub use powerup::{BulkReport, GridEffect};
pub use preset::CellPreset;
pub use quadrant::{Quadrant, QuadrantSnapshot};
