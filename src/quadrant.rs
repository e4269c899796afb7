//! Per-cell construction state machine
//!
//! Layers are laid strictly in order. `has_collision` always mirrors the
//! terminal layer, and `Destroyed` always implies the terminal layer is gone.
//! Every mutator validates before it writes, so a rejected request leaves the
//! quadrant untouched.

use rand::RngCore;
use serde::Serialize;

use crate::config::EraTemplate;
use crate::era::{self, EraVariant, ImpactOutcome, RepairAction, Wear};
use crate::error::BuildError;
use crate::layer::{LastLayerState, Layer, LAYER_COUNT, TERMINAL_LAYER};

/// What a successful `try_add_layer` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built { layer: usize },
    /// The damaged terminal layer was re-laid.
    Repaired,
}

/// Read-only view handed to presenters and audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuadrantSnapshot {
    pub x: i32,
    pub z: i32,
    pub era: EraVariant,
    pub layers: [bool; LAYER_COUNT],
    pub last_layer_state: LastLayerState,
    pub has_collision: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quadrant {
    coordinates: (i32, i32),
    era: EraVariant,
    template: EraTemplate,
    layers: [Layer; LAYER_COUNT],
    has_collision: bool,
    last_layer_state: LastLayerState,
    wear: Wear,
}

impl Quadrant {
    pub(crate) fn new(x: i32, z: i32, era: EraVariant, template: EraTemplate) -> Self {
        Self {
            coordinates: (x, z),
            era,
            template,
            layers: [Layer::default(); LAYER_COUNT],
            has_collision: false,
            last_layer_state: LastLayerState::Complete,
            wear: Wear::fresh(&template),
        }
    }

    pub fn coordinates(&self) -> (i32, i32) {
        self.coordinates
    }

    pub fn era(&self) -> EraVariant {
        self.era
    }

    pub fn template(&self) -> &EraTemplate {
        &self.template
    }

    pub fn layers(&self) -> &[Layer; LAYER_COUNT] {
        &self.layers
    }

    pub fn layer_flags(&self) -> [bool; LAYER_COUNT] {
        self.layers.map(|layer| layer.completed)
    }

    pub fn is_layer_completed(&self, index: usize) -> bool {
        self.layers.get(index).is_some_and(|layer| layer.completed)
    }

    pub fn completed_layers(&self) -> usize {
        self.layers.iter().filter(|layer| layer.completed).count()
    }

    /// Lowest layer still to be built, `None` once the terminal layer stands.
    pub fn first_incomplete(&self) -> Option<usize> {
        self.layers.iter().position(|layer| !layer.completed)
    }

    pub fn has_collision(&self) -> bool {
        self.has_collision
    }

    pub fn last_layer_state(&self) -> LastLayerState {
        self.last_layer_state
    }

    pub fn is_damaged(&self) -> bool {
        self.last_layer_state == LastLayerState::Damaged
    }

    pub fn wear(&self) -> Wear {
        self.wear
    }

    pub fn uses_since_repair(&self) -> u32 {
        self.wear.uses_since_repair
    }

    pub fn temperature(&self) -> f32 {
        self.wear.temperature
    }

    pub fn battery_level(&self) -> f32 {
        self.wear.battery_level
    }

    pub fn snapshot(&self) -> QuadrantSnapshot {
        QuadrantSnapshot {
            x: self.coordinates.0,
            z: self.coordinates.1,
            era: self.era,
            layers: self.layer_flags(),
            last_layer_state: self.last_layer_state,
            has_collision: self.has_collision,
        }
    }

    pub fn try_add_layer(&mut self, index: usize) -> Result<BuildOutcome, BuildError> {
        if index >= LAYER_COUNT {
            return Err(BuildError::InvalidLayerIndex { index });
        }

        if self.layers[index].completed {
            if index == TERMINAL_LAYER && self.last_layer_state == LastLayerState::Damaged {
                self.last_layer_state = LastLayerState::Complete;
                self.wear = Wear::fresh(&self.template);
                return Ok(BuildOutcome::Repaired);
            }
            return Err(BuildError::AlreadyCompleted { index });
        }

        let expected = self.first_incomplete().unwrap_or(TERMINAL_LAYER);
        if index != expected {
            return Err(BuildError::OutOfSequence { expected });
        }

        if index == 0 && self.last_layer_state == LastLayerState::Destroyed {
            self.last_layer_state = LastLayerState::Complete;
        }

        self.layers[index].completed = true;
        self.sync_collision();
        if self.has_collision {
            self.last_layer_state = LastLayerState::Complete;
            self.wear = Wear::fresh(&self.template);
        }
        Ok(BuildOutcome::Built { layer: index })
    }

    /// Passive decay. Returns the new state when the terminal condition changed.
    pub fn update_state(&mut self, dt: f32) -> Option<LastLayerState> {
        if !self.has_collision {
            return None;
        }
        let step = era::decay(
            self.era,
            &self.template,
            self.last_layer_state,
            self.wear,
            dt,
        );
        self.wear = step.wear;
        match step.transition {
            Some(next) if next != self.last_layer_state => {
                self.last_layer_state = next;
                self.sync_collision();
                Some(next)
            }
            _ => None,
        }
    }

    pub fn on_impact(&mut self, rng: &mut dyn RngCore) -> ImpactOutcome {
        let step = era::on_impact(
            self.era,
            &self.template,
            self.layers[TERMINAL_LAYER].completed,
            self.last_layer_state,
            self.wear,
            rng,
        );
        self.wear = step.wear;
        match step.outcome {
            ImpactOutcome::Demolished => {
                self.layers = [Layer::default(); LAYER_COUNT];
                self.last_layer_state = LastLayerState::Destroyed;
            }
            ImpactOutcome::TerminalLost => {
                self.layers[TERMINAL_LAYER].completed = false;
                self.last_layer_state = LastLayerState::Destroyed;
            }
            ImpactOutcome::Damaged => {
                self.last_layer_state = LastLayerState::Damaged;
            }
            ImpactOutcome::Worn | ImpactOutcome::Unaffected => {}
        }
        self.sync_collision();
        step.outcome
    }

    pub fn apply_heat(&mut self) -> bool {
        self.repair(RepairAction::ApplyHeat)
    }

    pub fn replace_battery(&mut self) -> bool {
        self.repair(RepairAction::ReplaceBattery)
    }

    pub fn repair(&mut self, action: RepairAction) -> bool {
        match era::repair_action(
            self.era,
            &self.template,
            self.last_layer_state,
            self.wear,
            action,
        ) {
            Some(repair) => {
                self.wear = repair.wear;
                self.last_layer_state = repair.state;
                true
            }
            None => false,
        }
    }

    /// Scripted override of the terminal condition. Forcing `Destroyed`
    /// drops the terminal layer so the state stays consistent.
    pub fn set_last_layer_state(&mut self, state: LastLayerState) {
        if state == LastLayerState::Destroyed {
            self.layers[TERMINAL_LAYER].completed = false;
        }
        self.last_layer_state = state;
        self.sync_collision();
    }

    /// Checks ordering, collision mirroring and the destroyed/terminal rule.
    pub fn invariants_hold(&self) -> bool {
        let ordered = self
            .layers
            .windows(2)
            .all(|pair| pair[0].completed || !pair[1].completed);
        let collision = self.has_collision == self.layers[TERMINAL_LAYER].completed;
        let destroyed = self.last_layer_state != LastLayerState::Destroyed
            || !self.layers[TERMINAL_LAYER].completed;
        ordered && collision && destroyed
    }

    fn sync_collision(&mut self) {
        self.has_collision = self.layers[TERMINAL_LAYER].completed;
    }
}
