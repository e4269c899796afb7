//! Events published by the grid to explicitly registered observers

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::era::ImpactOutcome;
use crate::layer::LastLayerState;

/// Who asked for a layer to be built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSource {
    #[default]
    Player,
    Preset,
    PowerUp,
}

/// Opaque context carried alongside a build request and echoed in its event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialContext {
    pub source: BuildSource,
    #[serde(default)]
    pub material: Option<String>,
}

impl MaterialContext {
    pub fn player() -> Self {
        Self::default()
    }

    pub fn preset() -> Self {
        Self {
            source: BuildSource::Preset,
            material: None,
        }
    }

    pub fn power_up() -> Self {
        Self {
            source: BuildSource::PowerUp,
            material: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Construction,
    Damage,
    Destruction,
    Repair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    /// Damaged terminal layer re-laid.
    Rebuild,
    Battery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridEvent {
    LayerBuilt {
        x: i32,
        z: i32,
        layer: usize,
        context: MaterialContext,
    },
    Repaired {
        x: i32,
        z: i32,
        repair: RepairKind,
    },
    StateChanged {
        x: i32,
        z: i32,
        from: LastLayerState,
        to: LastLayerState,
    },
    Impacted {
        x: i32,
        z: i32,
        outcome: ImpactOutcome,
    },
    LayersSpawned {
        x: i32,
        z: i32,
        layers: Vec<usize>,
    },
    LayersTornDown {
        x: i32,
        z: i32,
        layers: Vec<usize>,
    },
    CollisionChanged {
        x: i32,
        z: i32,
        solid: bool,
    },
    Cue {
        x: i32,
        z: i32,
        cue: AudioCue,
    },
}

impl GridEvent {
    pub fn coordinates(&self) -> (i32, i32) {
        match self {
            GridEvent::LayerBuilt { x, z, .. }
            | GridEvent::Repaired { x, z, .. }
            | GridEvent::StateChanged { x, z, .. }
            | GridEvent::Impacted { x, z, .. }
            | GridEvent::LayersSpawned { x, z, .. }
            | GridEvent::LayersTornDown { x, z, .. }
            | GridEvent::CollisionChanged { x, z, .. }
            | GridEvent::Cue { x, z, .. } => (*x, *z),
        }
    }

    pub fn cue(&self) -> Option<AudioCue> {
        match self {
            GridEvent::Cue { cue, .. } => Some(*cue),
            _ => None,
        }
    }
}

/// Subscriber registered with the grid builder.
pub trait GridObserver {
    fn on_event(&mut self, event: &GridEvent);
}

impl<F> GridObserver for F
where
    F: FnMut(&GridEvent),
{
    fn on_event(&mut self, event: &GridEvent) {
        self(event)
    }
}

/// Forwards every event onto a channel. A dropped receiver is ignored.
pub struct ChannelObserver {
    sender: Sender<GridEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<GridEvent>) -> Self {
        Self { sender }
    }
}

impl GridObserver for ChannelObserver {
    fn on_event(&mut self, event: &GridEvent) {
        let _ = self.sender.send(event.clone());
    }
}
