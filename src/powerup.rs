//! Power-up effects driven through the grid's public operations

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::events::MaterialContext;
use crate::grid::QuadrantMut;
use crate::layer::TERMINAL_LAYER;

/// Global decay multiplier with a countdown in unscaled seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAcceleration {
    factor: f32,
    remaining: f32,
}

impl TimeAcceleration {
    /// `None` unless both factor and duration are finite and positive.
    pub fn new(factor: f32, duration: f32) -> Option<Self> {
        let valid = factor.is_finite() && factor > 0.0 && duration.is_finite() && duration > 0.0;
        valid.then_some(Self {
            factor,
            remaining: duration,
        })
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Counts down; `false` once expired.
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining > 0.0
    }
}

/// Built-in grid-wide effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridEffect {
    /// Lay the lowest missing layer in every cell.
    BuildNextLayer,
    /// Finish every cell up to the terminal layer.
    CompleteAll,
    /// Re-lay damaged terminal layers.
    RepairDamaged,
    ReplaceBatteries,
}

impl GridEffect {
    /// Builds are tagged with a `PowerUp` context.
    pub fn apply(&self, mut cell: QuadrantMut<'_>) -> Result<(), BuildError> {
        match self {
            GridEffect::BuildNextLayer => match cell.first_incomplete() {
                Some(layer) => cell.try_build_layer(layer, MaterialContext::power_up()),
                None => Err(BuildError::AlreadyCompleted {
                    index: TERMINAL_LAYER,
                }),
            },
            GridEffect::CompleteAll => {
                while let Some(layer) = cell.first_incomplete() {
                    cell.try_build_layer(layer, MaterialContext::power_up())?;
                }
                Ok(())
            }
            GridEffect::RepairDamaged => {
                if cell.is_damaged() && cell.has_collision() {
                    cell.try_build_layer(TERMINAL_LAYER, MaterialContext::power_up())?;
                }
                Ok(())
            }
            GridEffect::ReplaceBatteries => cell.replace_battery().map(drop),
        }
    }
}

/// Result of a bulk pass. Cell errors are counted, never propagated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub visited: usize,
    pub failed: usize,
}

/// Builds one cell layer by layer, one layer per elapsed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedBuild {
    x: i32,
    z: i32,
    interval: f32,
    elapsed: f32,
    context: MaterialContext,
}

impl StagedBuild {
    pub fn new(x: i32, z: i32, interval: f32, context: MaterialContext) -> Self {
        let interval = if interval.is_finite() {
            interval.max(0.0)
        } else {
            0.0
        };
        Self {
            x,
            z,
            interval,
            elapsed: 0.0,
            context,
        }
    }

    pub fn coordinates(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn context(&self) -> &MaterialContext {
        &self.context
    }

    /// Whether a layer is due this tick. At most one per call; leftover
    /// time carries over.
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            true
        } else {
            false
        }
    }
}
