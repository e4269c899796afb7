use proptest::prelude::*;

use quadrant_forge::{
    ConstructionGrid, EraVariant, GridBuilder, GridConfig, GridEffect, LastLayerState,
    MaterialContext, LAYER_COUNT,
};

#[derive(Debug, Clone)]
enum Op {
    Build { x: i32, z: i32, layer: usize },
    Impact { x: i32, z: i32 },
    Tick(f32),
    Heat { x: i32, z: i32 },
    Battery { x: i32, z: i32 },
    Force { x: i32, z: i32, state: LastLayerState },
    Effect(GridEffect),
}

fn era() -> impl Strategy<Value = EraVariant> {
    prop::sample::select(EraVariant::ALL.to_vec())
}

fn state() -> impl Strategy<Value = LastLayerState> {
    prop_oneof![
        Just(LastLayerState::Complete),
        Just(LastLayerState::Damaged),
        Just(LastLayerState::Destroyed),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    let coord = (-1i32..4, -1i32..3);
    prop_oneof![
        4 => (coord.clone(), 0usize..6).prop_map(|((x, z), layer)| Op::Build { x, z, layer }),
        3 => coord.clone().prop_map(|(x, z)| Op::Impact { x, z }),
        2 => (0.0f32..20.0).prop_map(Op::Tick),
        1 => coord.clone().prop_map(|(x, z)| Op::Heat { x, z }),
        1 => coord.clone().prop_map(|(x, z)| Op::Battery { x, z }),
        1 => (coord, state()).prop_map(|((x, z), state)| Op::Force { x, z, state }),
        1 => prop_oneof![
            Just(GridEffect::BuildNextLayer),
            Just(GridEffect::CompleteAll),
            Just(GridEffect::RepairDamaged),
            Just(GridEffect::ReplaceBatteries),
        ]
        .prop_map(Op::Effect),
    ]
}

fn grid(default_era: EraVariant, corner_era: EraVariant, seed: u64) -> ConstructionGrid {
    let config = GridConfig::single_era(3, 2, default_era)
        .with_seed(seed)
        .with_era_at(2, 1, corner_era);
    GridBuilder::new(config).build().unwrap()
}

fn apply(grid: &mut ConstructionGrid, op: &Op) {
    match op {
        Op::Build { x, z, layer } => {
            let _ = grid.try_build_layer(*x, *z, *layer, MaterialContext::player());
        }
        Op::Impact { x, z } => {
            let _ = grid.on_vehicle_impact(*x, *z);
        }
        Op::Tick(dt) => grid.tick(*dt),
        Op::Heat { x, z } => {
            let _ = grid.apply_heat(*x, *z);
        }
        Op::Battery { x, z } => {
            let _ = grid.replace_battery(*x, *z);
        }
        Op::Force { x, z, state } => {
            let _ = grid.set_last_layer_state(*x, *z, *state);
        }
        Op::Effect(effect) => {
            grid.apply_effect(*effect);
        }
    }
}

proptest! {
    #[test]
    fn invariants_hold_after_every_operation(
        default_era in era(),
        corner_era in era(),
        seed in any::<u64>(),
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut grid = grid(default_era, corner_era, seed);
        for op in &ops {
            apply(&mut grid, op);
            for quadrant in grid.quadrants() {
                prop_assert!(quadrant.invariants_hold(), "{op:?} broke {quadrant:?}");
                prop_assert_eq!(quadrant.has_collision(), quadrant.is_layer_completed(LAYER_COUNT - 1));
            }
        }
    }

    #[test]
    fn rejected_builds_never_mutate(
        default_era in era(),
        seed in any::<u64>(),
        ops in prop::collection::vec(op(), 0..40),
        x in 0i32..3,
        z in 0i32..2,
        layer in 0usize..6,
    ) {
        let mut grid = grid(default_era, default_era, seed);
        for op in &ops {
            apply(&mut grid, op);
        }
        let before = grid.get_quadrant(x, z).unwrap().clone();
        if grid.try_build_layer(x, z, layer, MaterialContext::player()).is_err() {
            prop_assert_eq!(grid.get_quadrant(x, z).unwrap(), &before);
        }
    }

    #[test]
    fn impact_on_unfinished_cell_always_demolishes(
        default_era in era(),
        seed in any::<u64>(),
        built in 0usize..LAYER_COUNT,
    ) {
        let mut grid = grid(default_era, default_era, seed);
        for layer in 0..built {
            grid.try_build_layer(1, 1, layer, MaterialContext::player()).unwrap();
        }
        grid.on_vehicle_impact(1, 1).unwrap();
        let state = grid.quadrant_state(1, 1).unwrap();
        prop_assert_eq!(state.layers, [false; LAYER_COUNT]);
        prop_assert_eq!(state.last_layer_state, LastLayerState::Destroyed);
    }
}
