//! Era rules
//!
//! Each era is a closed variant with its own wear model. The rules are pure:
//! they take the terminal-layer condition and the wear counters by value and
//! hand back the new counters plus the transition to apply. `Quadrant` owns
//! the bookkeeping; nothing here touches layers directly.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::EraTemplate;
use crate::layer::LastLayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraVariant {
    Prehistoric,
    Medieval,
    Industrial,
    Contemporary,
    Futuristic,
}

impl EraVariant {
    pub const ALL: [EraVariant; 5] = [
        EraVariant::Prehistoric,
        EraVariant::Medieval,
        EraVariant::Industrial,
        EraVariant::Contemporary,
        EraVariant::Futuristic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EraVariant::Prehistoric => "prehistoric",
            EraVariant::Medieval => "medieval",
            EraVariant::Industrial => "industrial",
            EraVariant::Contemporary => "contemporary",
            EraVariant::Futuristic => "futuristic",
        }
    }

    /// Strategy lookup for this era.
    pub fn rules(self) -> &'static dyn EraRules {
        match self {
            EraVariant::Prehistoric => &PREHISTORIC,
            EraVariant::Medieval => &MEDIEVAL,
            EraVariant::Industrial => &INDUSTRIAL,
            EraVariant::Contemporary => &CONTEMPORARY,
            EraVariant::Futuristic => &FUTURISTIC,
        }
    }
}

/// Era-specific counters. Eras ignore the fields they do not use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wear {
    pub uses_since_repair: u32,
    pub temperature: f32,
    pub battery_level: f32,
}

impl Wear {
    /// Counters as they stand right after the terminal layer is laid or repaired.
    pub fn fresh(template: &EraTemplate) -> Self {
        Self {
            uses_since_repair: 0,
            temperature: template.max_temperature,
            battery_level: template.max_battery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decay {
    pub wear: Wear,
    pub transition: Option<LastLayerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactOutcome {
    /// Terminal layer was never completed; every layer is reset.
    Demolished,
    /// Terminal layer dropped, lower layers kept.
    TerminalLost,
    Damaged,
    /// Counted against the structure without a state change.
    Worn,
    Unaffected,
}

impl ImpactOutcome {
    pub fn is_destructive(&self) -> bool {
        matches!(self, ImpactOutcome::Demolished | ImpactOutcome::TerminalLost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactStep {
    pub wear: Wear,
    pub outcome: ImpactOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    ApplyHeat,
    ReplaceBattery,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repair {
    pub wear: Wear,
    pub state: LastLayerState,
}

/// Per-era behaviour. Defaults describe an era with no passive decay, no
/// extra impact wear and no restorative actions.
pub trait EraRules: Sync {
    fn era(&self) -> EraVariant;

    fn decay(
        &self,
        _template: &EraTemplate,
        _state: LastLayerState,
        wear: Wear,
        _dt: f32,
    ) -> Decay {
        Decay {
            wear,
            transition: None,
        }
    }

    /// Impact on a structure whose terminal layer is completed.
    fn impact(
        &self,
        _template: &EraTemplate,
        _state: LastLayerState,
        wear: Wear,
        _rng: &mut dyn RngCore,
    ) -> ImpactStep {
        ImpactStep {
            wear,
            outcome: ImpactOutcome::Unaffected,
        }
    }

    fn repair(
        &self,
        _template: &EraTemplate,
        _state: LastLayerState,
        _wear: Wear,
        _action: RepairAction,
    ) -> Option<Repair> {
        None
    }
}

/// Passive decay for a built structure.
pub fn decay(
    era: EraVariant,
    template: &EraTemplate,
    state: LastLayerState,
    wear: Wear,
    dt: f32,
) -> Decay {
    let dt = if dt.is_nan() { 0.0 } else { dt.clamp(0.0, f32::MAX) };
    era.rules().decay(template, state, wear, dt)
}

/// Impact resolution. An incomplete terminal layer means demolition in every
/// era; only finished structures reach the era strategy.
pub fn on_impact(
    era: EraVariant,
    template: &EraTemplate,
    terminal_completed: bool,
    state: LastLayerState,
    wear: Wear,
    rng: &mut dyn RngCore,
) -> ImpactStep {
    if !terminal_completed {
        return ImpactStep {
            wear,
            outcome: ImpactOutcome::Demolished,
        };
    }
    era.rules().impact(template, state, wear, rng)
}

pub fn repair_action(
    era: EraVariant,
    template: &EraTemplate,
    state: LastLayerState,
    wear: Wear,
    action: RepairAction,
) -> Option<Repair> {
    era.rules().repair(template, state, wear, action)
}

static PREHISTORIC: UsageWear = UsageWear(EraVariant::Prehistoric);
static MEDIEVAL: UsageWear = UsageWear(EraVariant::Medieval);
static INDUSTRIAL: Cooling = Cooling;
static CONTEMPORARY: ChanceWear = ChanceWear;
static FUTURISTIC: BatteryDrain = BatteryDrain;

/// Counts impacts: damaged at half the budget, terminal layer lost at the full budget.
struct UsageWear(EraVariant);

impl EraRules for UsageWear {
    fn era(&self) -> EraVariant {
        self.0
    }

    fn impact(
        &self,
        template: &EraTemplate,
        state: LastLayerState,
        mut wear: Wear,
        _rng: &mut dyn RngCore,
    ) -> ImpactStep {
        wear.uses_since_repair = wear.uses_since_repair.saturating_add(1);
        let max_uses = template.max_uses_before_damage;
        let outcome = match state {
            LastLayerState::Complete if wear.uses_since_repair >= max_uses / 2 => {
                ImpactOutcome::Damaged
            }
            LastLayerState::Damaged if wear.uses_since_repair >= max_uses => {
                ImpactOutcome::TerminalLost
            }
            _ => ImpactOutcome::Worn,
        };
        ImpactStep { wear, outcome }
    }
}

struct Cooling;

impl EraRules for Cooling {
    fn era(&self) -> EraVariant {
        EraVariant::Industrial
    }

    fn decay(
        &self,
        template: &EraTemplate,
        state: LastLayerState,
        mut wear: Wear,
        dt: f32,
    ) -> Decay {
        wear.temperature = (wear.temperature - template.cooling_rate * dt).max(0.0);
        let transition = (state == LastLayerState::Complete
            && wear.temperature < template.max_temperature / 2.0)
            .then_some(LastLayerState::Damaged);
        Decay { wear, transition }
    }

    // Heat is accepted but has no effect yet.
    fn repair(
        &self,
        _template: &EraTemplate,
        _state: LastLayerState,
        _wear: Wear,
        _action: RepairAction,
    ) -> Option<Repair> {
        None
    }
}

/// One roll per impact against `damage_chance`, one state step at most.
struct ChanceWear;

impl EraRules for ChanceWear {
    fn era(&self) -> EraVariant {
        EraVariant::Contemporary
    }

    fn impact(
        &self,
        template: &EraTemplate,
        state: LastLayerState,
        wear: Wear,
        rng: &mut dyn RngCore,
    ) -> ImpactStep {
        let outcome = match state {
            LastLayerState::Complete if rng.gen::<f32>() < template.damage_chance => {
                ImpactOutcome::Damaged
            }
            LastLayerState::Damaged if rng.gen::<f32>() < template.damage_chance => {
                ImpactOutcome::TerminalLost
            }
            _ => ImpactOutcome::Unaffected,
        };
        ImpactStep { wear, outcome }
    }
}

struct BatteryDrain;

impl EraRules for BatteryDrain {
    fn era(&self) -> EraVariant {
        EraVariant::Futuristic
    }

    fn decay(
        &self,
        template: &EraTemplate,
        state: LastLayerState,
        mut wear: Wear,
        dt: f32,
    ) -> Decay {
        wear.battery_level = (wear.battery_level - template.battery_drain_rate * dt).max(0.0);
        let transition = (state == LastLayerState::Complete
            && wear.battery_level < template.battery_damage_threshold)
            .then_some(LastLayerState::Damaged);
        Decay { wear, transition }
    }

    fn repair(
        &self,
        template: &EraTemplate,
        state: LastLayerState,
        mut wear: Wear,
        action: RepairAction,
    ) -> Option<Repair> {
        if action != RepairAction::ReplaceBattery || state == LastLayerState::Destroyed {
            return None;
        }
        wear.battery_level = template.max_battery;
        Some(Repair {
            wear,
            state: LastLayerState::Complete,
        })
    }
}
