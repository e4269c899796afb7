//! Construction grid
//!
//! Owns every quadrant in a flat arena addressed by `z * width + x`. All
//! mutation goes through the coordinate-indexed operations below; each one
//! validates coordinates first, delegates to the addressed quadrant, then
//! resyncs that cell's presentation and publishes events to the observers
//! registered on the builder.

use std::ops::Deref;

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::config::GridConfig;
use crate::era::ImpactOutcome;
use crate::error::{BuildError, ConfigError};
use crate::events::{AudioCue, GridEvent, GridObserver, MaterialContext, RepairKind};
use crate::layer::{layer_name, LastLayerState};
use crate::powerup::{BulkReport, GridEffect, StagedBuild, TimeAcceleration};
use crate::preset;
use crate::presentation::PresentationCache;
use crate::quadrant::{BuildOutcome, Quadrant, QuadrantSnapshot};
use crate::rng::{RngManager, IMPACT_STREAM};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    pub name: String,
    pub tick: u64,
    pub width: usize,
    pub length: usize,
    pub time_multiplier: f32,
    pub quadrants: Vec<QuadrantSnapshot>,
}

pub struct GridBuilder {
    config: GridConfig,
    observers: Vec<Box<dyn GridObserver>>,
}

impl GridBuilder {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl GridObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Validates the config, creates every quadrant from its era template
    /// and applies configured presets.
    pub fn build(self) -> Result<ConstructionGrid, ConfigError> {
        let config = self.config;
        config.validate()?;

        let mut cells = Vec::with_capacity(config.width * config.length);
        for z in 0..config.length as i32 {
            for x in 0..config.width as i32 {
                let era = config.era_at(x, z);
                cells.push(Quadrant::new(x, z, era, config.template(era)?));
            }
        }

        let mut grid = ConstructionGrid {
            name: config.name.clone(),
            width: config.width,
            length: config.length,
            presentation: PresentationCache::new(cells.len()),
            cells,
            rng: RngManager::new(config.seed),
            boost: None,
            staged: Vec::new(),
            observers: self.observers,
            tick: 0,
        };
        info!(
            "grid '{}' initialised: {}x{} quadrants, default era {}",
            grid.name,
            grid.width,
            grid.length,
            config.default_era.as_str()
        );

        preset::apply_presets(&mut grid, &config.presets)
            .map_err(|err| ConfigError::Validation(format!("preset failed: {err}")))?;
        Ok(grid)
    }
}

pub struct ConstructionGrid {
    name: String,
    width: usize,
    length: usize,
    cells: Vec<Quadrant>,
    presentation: PresentationCache,
    rng: RngManager,
    boost: Option<TimeAcceleration>,
    staged: Vec<StagedBuild>,
    observers: Vec<Box<dyn GridObserver>>,
    tick: u64,
}

impl ConstructionGrid {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn is_valid_quadrant(&self, x: i32, z: i32) -> bool {
        self.index_of(x, z).is_ok()
    }

    pub fn get_quadrant(&self, x: i32, z: i32) -> Option<&Quadrant> {
        self.index_of(x, z).ok().map(|index| &self.cells[index])
    }

    pub fn quadrant_state(&self, x: i32, z: i32) -> Option<QuadrantSnapshot> {
        self.get_quadrant(x, z).map(Quadrant::snapshot)
    }

    /// Row-major iteration: `x` varies fastest.
    pub fn quadrants(&self) -> impl Iterator<Item = &Quadrant> {
        self.cells.iter()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            name: self.name.clone(),
            tick: self.tick,
            width: self.width,
            length: self.length,
            time_multiplier: self.time_multiplier(),
            quadrants: self.cells.iter().map(Quadrant::snapshot).collect(),
        }
    }

    pub fn try_build_layer(
        &mut self,
        x: i32,
        z: i32,
        layer: usize,
        context: MaterialContext,
    ) -> Result<(), BuildError> {
        let index = self.index_of(x, z)?;
        let before = self.cells[index].last_layer_state();
        let outcome = match self.cells[index].try_add_layer(layer) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("build of layer {layer} at ({x}, {z}) rejected: {err}");
                return Err(err);
            }
        };
        let after = self.cells[index].last_layer_state();

        match outcome {
            BuildOutcome::Built { layer } => {
                trace!(
                    "laid {} layer at ({x}, {z}) for {:?}",
                    layer_name(layer).unwrap_or("unknown"),
                    context.source
                );
                self.emit(GridEvent::LayerBuilt {
                    x,
                    z,
                    layer,
                    context,
                });
                self.emit_transition(x, z, before, after);
                self.emit(GridEvent::Cue {
                    x,
                    z,
                    cue: AudioCue::Construction,
                });
            }
            BuildOutcome::Repaired => {
                self.emit(GridEvent::Repaired {
                    x,
                    z,
                    repair: RepairKind::Rebuild,
                });
                self.emit_transition(x, z, before, after);
                self.emit(GridEvent::Cue {
                    x,
                    z,
                    cue: AudioCue::Repair,
                });
            }
        }
        self.resync(index);
        Ok(())
    }

    pub fn on_vehicle_impact(&mut self, x: i32, z: i32) -> Result<ImpactOutcome, BuildError> {
        let index = self.index_of(x, z)?;
        let before = self.cells[index].last_layer_state();
        let outcome = self.cells[index].on_impact(self.rng.stream(IMPACT_STREAM));
        let after = self.cells[index].last_layer_state();
        debug!("impact at ({x}, {z}): {outcome:?}");

        self.emit(GridEvent::Impacted { x, z, outcome });
        self.emit_transition(x, z, before, after);
        let torn_down = self.resync(index);
        let cue = match outcome {
            ImpactOutcome::Demolished | ImpactOutcome::TerminalLost
                if before != after || torn_down =>
            {
                Some(AudioCue::Destruction)
            }
            ImpactOutcome::Damaged if before != after => Some(AudioCue::Damage),
            _ => None,
        };
        if let Some(cue) = cue {
            self.emit(GridEvent::Cue { x, z, cue });
        }
        Ok(outcome)
    }

    /// Reserved hook; currently accepted by no era.
    pub fn apply_heat(&mut self, x: i32, z: i32) -> Result<bool, BuildError> {
        let index = self.index_of(x, z)?;
        let applied = self.cells[index].apply_heat();
        self.resync(index);
        Ok(applied)
    }

    pub fn replace_battery(&mut self, x: i32, z: i32) -> Result<bool, BuildError> {
        let index = self.index_of(x, z)?;
        let before = self.cells[index].last_layer_state();
        let applied = self.cells[index].replace_battery();
        let after = self.cells[index].last_layer_state();
        if applied {
            self.emit(GridEvent::Repaired {
                x,
                z,
                repair: RepairKind::Battery,
            });
            if before != after {
                self.emit_transition(x, z, before, after);
                self.emit(GridEvent::Cue {
                    x,
                    z,
                    cue: AudioCue::Repair,
                });
            }
        }
        self.resync(index);
        Ok(applied)
    }

    /// Scripted override of a cell's terminal condition.
    pub fn set_last_layer_state(
        &mut self,
        x: i32,
        z: i32,
        state: LastLayerState,
    ) -> Result<(), BuildError> {
        let index = self.index_of(x, z)?;
        let before = self.cells[index].last_layer_state();
        self.cells[index].set_last_layer_state(state);
        debug!(
            "forced ({x}, {z}) from {} to {}",
            before.as_str(),
            state.as_str()
        );
        self.emit_transition(x, z, before, state);
        self.resync(index);
        Ok(())
    }

    /// Hands every cell, in row-major order, to `effect`. Cell errors are
    /// logged and counted; they never stop the pass.
    pub fn apply_effect_to_all_quadrants<F>(&mut self, mut effect: F) -> BulkReport
    where
        F: FnMut(QuadrantMut<'_>) -> Result<(), BuildError>,
    {
        let mut report = BulkReport::default();
        for index in 0..self.cells.len() {
            let (x, z) = self.cells[index].coordinates();
            let cell = QuadrantMut {
                grid: &mut *self,
                index,
                x,
                z,
            };
            if let Err(err) = effect(cell) {
                debug!("bulk effect skipped ({x}, {z}): {err}");
                report.failed += 1;
            }
            report.visited += 1;
        }
        report
    }

    pub fn apply_effect(&mut self, effect: GridEffect) -> BulkReport {
        info!("applying {effect:?} to grid '{}'", self.name);
        self.apply_effect_to_all_quadrants(|cell| effect.apply(cell))
    }

    /// Scales decay by `factor` for `duration` seconds of unscaled time.
    /// Replaces any boost already running.
    pub fn activate_time_acceleration(&mut self, factor: f32, duration: f32) -> bool {
        match TimeAcceleration::new(factor, duration) {
            Some(boost) => {
                info!("time acceleration x{factor} for {duration}s");
                self.boost = Some(boost);
                true
            }
            None => {
                warn!("ignoring time acceleration x{factor} for {duration}s");
                false
            }
        }
    }

    pub fn time_multiplier(&self) -> f32 {
        self.boost.map(|boost| boost.factor()).unwrap_or(1.0)
    }

    pub fn time_acceleration(&self) -> Option<&TimeAcceleration> {
        self.boost.as_ref()
    }

    /// Builds the cell one layer per `interval` seconds, driven by `tick`.
    pub fn queue_staged_build(
        &mut self,
        x: i32,
        z: i32,
        interval: f32,
        context: MaterialContext,
    ) -> Result<(), BuildError> {
        self.index_of(x, z)?;
        self.staged.push(StagedBuild::new(x, z, interval, context));
        Ok(())
    }

    pub fn pending_staged_builds(&self) -> usize {
        self.staged.len()
    }

    /// One frame: decay every cell, count down the active boost, then
    /// advance staged builds.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let scaled = (dt * self.time_multiplier()).min(f32::MAX);

        for index in 0..self.cells.len() {
            let before = self.cells[index].last_layer_state();
            if let Some(next) = self.cells[index].update_state(scaled) {
                let (x, z) = self.cells[index].coordinates();
                trace!(
                    "decay at ({x}, {z}): {} -> {}",
                    before.as_str(),
                    next.as_str()
                );
                self.emit_transition(x, z, before, next);
                if next == LastLayerState::Damaged {
                    self.emit(GridEvent::Cue {
                        x,
                        z,
                        cue: AudioCue::Damage,
                    });
                }
                self.resync(index);
            }
        }

        if let Some(boost) = self.boost.as_mut() {
            if !boost.advance(dt) {
                info!("time acceleration expired");
                self.boost = None;
            }
        }

        self.advance_staged_builds(dt);
        self.tick += 1;
    }

    fn advance_staged_builds(&mut self, dt: f32) {
        if self.staged.is_empty() {
            return;
        }
        let mut tasks = std::mem::take(&mut self.staged);
        tasks.retain_mut(|task| {
            if !task.advance(dt) {
                return true;
            }
            let (x, z) = task.coordinates();
            let Some(layer) = self.get_quadrant(x, z).and_then(Quadrant::first_incomplete) else {
                return false;
            };
            match self.try_build_layer(x, z, layer, task.context().clone()) {
                Ok(()) => self
                    .get_quadrant(x, z)
                    .is_some_and(|quadrant| quadrant.first_incomplete().is_some()),
                Err(err) => {
                    debug!("staged build at ({x}, {z}) stopped: {err}");
                    false
                }
            }
        });
        tasks.append(&mut self.staged);
        self.staged = tasks;
    }

    fn index_of(&self, x: i32, z: i32) -> Result<usize, BuildError> {
        if x < 0 || z < 0 || x as usize >= self.width || z as usize >= self.length {
            return Err(BuildError::InvalidCoordinates { x, z });
        }
        Ok(z as usize * self.width + x as usize)
    }

    /// Returns whether any rendered layer was torn down.
    fn resync(&mut self, index: usize) -> bool {
        let resync = self.presentation.resync(index, &self.cells[index]);
        if resync.is_empty() {
            return false;
        }
        let (x, z) = self.cells[index].coordinates();
        let torn_down = !resync.torn_down.is_empty();
        if !resync.torn_down.is_empty() {
            self.emit(GridEvent::LayersTornDown {
                x,
                z,
                layers: resync.torn_down,
            });
        }
        if !resync.spawned.is_empty() {
            self.emit(GridEvent::LayersSpawned {
                x,
                z,
                layers: resync.spawned,
            });
        }
        if let Some(solid) = resync.collision {
            self.emit(GridEvent::CollisionChanged { x, z, solid });
        }
        torn_down
    }

    fn emit_transition(&mut self, x: i32, z: i32, from: LastLayerState, to: LastLayerState) {
        if from != to {
            self.emit(GridEvent::StateChanged { x, z, from, to });
        }
    }

    fn emit(&mut self, event: GridEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}

/// One cell of the grid, handed to bulk effects.
///
/// Reads go straight to the quadrant. Writes go through the grid's
/// coordinate-indexed operations, so they validate, resync and publish
/// events exactly like direct calls.
pub struct QuadrantMut<'a> {
    grid: &'a mut ConstructionGrid,
    index: usize,
    x: i32,
    z: i32,
}

impl QuadrantMut<'_> {
    pub fn try_build_layer(
        &mut self,
        layer: usize,
        context: MaterialContext,
    ) -> Result<(), BuildError> {
        self.grid.try_build_layer(self.x, self.z, layer, context)
    }

    pub fn on_vehicle_impact(&mut self) -> Result<ImpactOutcome, BuildError> {
        self.grid.on_vehicle_impact(self.x, self.z)
    }

    pub fn apply_heat(&mut self) -> Result<bool, BuildError> {
        self.grid.apply_heat(self.x, self.z)
    }

    pub fn replace_battery(&mut self) -> Result<bool, BuildError> {
        self.grid.replace_battery(self.x, self.z)
    }

    pub fn set_last_layer_state(&mut self, state: LastLayerState) -> Result<(), BuildError> {
        self.grid.set_last_layer_state(self.x, self.z, state)
    }
}

impl Deref for QuadrantMut<'_> {
    type Target = Quadrant;

    fn deref(&self) -> &Quadrant {
        &self.grid.cells[self.index]
    }
}
