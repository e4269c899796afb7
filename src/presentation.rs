//! Presentation cache
//!
//! Tracks what the presenter was last told about each cell so the grid only
//! publishes differences: layers to spawn, layers to tear down and collision
//! toggles.

use crate::layer::LAYER_COUNT;
use crate::quadrant::Quadrant;

#[derive(Debug, Clone, Copy, Default)]
struct PresentationSlot {
    rendered: [bool; LAYER_COUNT],
    solid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resync {
    pub spawned: Vec<usize>,
    pub torn_down: Vec<usize>,
    pub collision: Option<bool>,
}

impl Resync {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.torn_down.is_empty() && self.collision.is_none()
    }
}

pub struct PresentationCache {
    slots: Vec<PresentationSlot>,
}

impl PresentationCache {
    pub fn new(cells: usize) -> Self {
        Self {
            slots: vec![PresentationSlot::default(); cells],
        }
    }

    pub fn resync(&mut self, index: usize, quadrant: &Quadrant) -> Resync {
        let Some(slot) = self.slots.get_mut(index) else {
            return Resync::default();
        };
        let mut resync = Resync::default();
        for (layer, completed) in quadrant.layer_flags().into_iter().enumerate() {
            match (slot.rendered[layer], completed) {
                (false, true) => resync.spawned.push(layer),
                (true, false) => resync.torn_down.push(layer),
                _ => {}
            }
            slot.rendered[layer] = completed;
        }
        if slot.solid != quadrant.has_collision() {
            slot.solid = quadrant.has_collision();
            resync.collision = Some(slot.solid);
        }
        resync
    }
}
