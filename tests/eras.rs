use quadrant_forge::{
    ConstructionGrid, EraTemplate, EraVariant, GridBuilder, GridConfig, GridEffect,
    ImpactOutcome, LastLayerState, MaterialContext, LAYER_COUNT,
};

fn single_cell(era: EraVariant, template: EraTemplate, seed: u64) -> ConstructionGrid {
    let config = GridConfig::single_era(1, 1, era)
        .with_seed(seed)
        .with_template(era, template);
    GridBuilder::new(config).build().unwrap()
}

fn finish(grid: &mut ConstructionGrid) {
    for layer in 0..LAYER_COUNT {
        grid.try_build_layer(0, 0, layer, MaterialContext::player())
            .unwrap();
    }
}

fn state(grid: &ConstructionGrid) -> LastLayerState {
    grid.get_quadrant(0, 0).unwrap().last_layer_state()
}

#[test]
fn medieval_uses_its_own_budget() {
    let mut grid = single_cell(
        EraVariant::Medieval,
        EraTemplate {
            max_uses_before_damage: 4,
            ..EraTemplate::default()
        },
        0,
    );
    finish(&mut grid);
    assert_eq!(grid.on_vehicle_impact(0, 0), Ok(ImpactOutcome::Worn));
    assert_eq!(grid.on_vehicle_impact(0, 0), Ok(ImpactOutcome::Damaged));
    assert_eq!(grid.on_vehicle_impact(0, 0), Ok(ImpactOutcome::Worn));
    assert_eq!(
        grid.on_vehicle_impact(0, 0),
        Ok(ImpactOutcome::TerminalLost)
    );
    assert_eq!(state(&grid), LastLayerState::Destroyed);
    assert_eq!(
        grid.quadrant_state(0, 0).unwrap().layers,
        [true, true, true, false]
    );
}

#[test]
fn impact_after_terminal_loss_demolishes_the_rest() {
    let mut grid = single_cell(
        EraVariant::Prehistoric,
        EraTemplate {
            max_uses_before_damage: 2,
            ..EraTemplate::default()
        },
        0,
    );
    finish(&mut grid);
    grid.on_vehicle_impact(0, 0).unwrap();
    grid.on_vehicle_impact(0, 0).unwrap();
    assert_eq!(state(&grid), LastLayerState::Destroyed);
    assert_eq!(
        grid.on_vehicle_impact(0, 0),
        Ok(ImpactOutcome::Demolished)
    );
    assert_eq!(
        grid.quadrant_state(0, 0).unwrap().layers,
        [false; LAYER_COUNT]
    );
}

#[test]
fn contemporary_damage_is_certain_at_full_chance() {
    let mut grid = single_cell(
        EraVariant::Contemporary,
        EraTemplate {
            damage_chance: 1.0,
            ..EraTemplate::default()
        },
        3,
    );
    finish(&mut grid);
    assert_eq!(grid.on_vehicle_impact(0, 0), Ok(ImpactOutcome::Damaged));
    assert_eq!(
        grid.on_vehicle_impact(0, 0),
        Ok(ImpactOutcome::TerminalLost)
    );
    assert!(!grid.get_quadrant(0, 0).unwrap().has_collision());
}

#[test]
fn contemporary_rolls_replay_with_the_same_seed() {
    let template = EraTemplate {
        damage_chance: 0.3,
        ..EraTemplate::default()
    };
    let run = |seed| {
        let mut grid = single_cell(EraVariant::Contemporary, template, seed);
        let mut outcomes = Vec::new();
        for _ in 0..20 {
            if grid.get_quadrant(0, 0).unwrap().first_incomplete().is_some() {
                finish_from_current(&mut grid);
            }
            outcomes.push(grid.on_vehicle_impact(0, 0).unwrap());
        }
        outcomes
    };
    assert_eq!(run(21), run(21));
}

fn finish_from_current(grid: &mut ConstructionGrid) {
    while let Some(layer) = grid.get_quadrant(0, 0).unwrap().first_incomplete() {
        grid.try_build_layer(0, 0, layer, MaterialContext::player())
            .unwrap();
    }
}

#[test]
fn industrial_cools_only_once_finished() {
    let template = EraTemplate {
        max_temperature: 100.0,
        cooling_rate: 10.0,
        ..EraTemplate::default()
    };
    let mut grid = single_cell(EraVariant::Industrial, template, 0);
    grid.tick(30.0);
    assert_eq!(grid.get_quadrant(0, 0).unwrap().temperature(), 100.0);

    finish(&mut grid);
    grid.tick(4.0);
    assert_eq!(state(&grid), LastLayerState::Complete);
    grid.tick(2.0);
    assert_eq!(state(&grid), LastLayerState::Damaged);
    assert_eq!(grid.apply_heat(0, 0), Ok(false));
    assert_eq!(state(&grid), LastLayerState::Damaged);

    grid.try_build_layer(0, 0, 3, MaterialContext::player())
        .unwrap();
    assert_eq!(state(&grid), LastLayerState::Complete);
    assert_eq!(grid.get_quadrant(0, 0).unwrap().temperature(), 100.0);
}

#[test]
fn industrial_and_futuristic_shrug_off_impacts_when_finished() {
    for era in [EraVariant::Industrial, EraVariant::Futuristic] {
        let mut grid = single_cell(era, EraTemplate::default(), 0);
        finish(&mut grid);
        for _ in 0..50 {
            assert_eq!(grid.on_vehicle_impact(0, 0), Ok(ImpactOutcome::Unaffected));
        }
        assert_eq!(state(&grid), LastLayerState::Complete);
    }
}

#[test]
fn battery_replacement_is_gated_on_destruction() {
    let mut grid = single_cell(EraVariant::Futuristic, EraTemplate::default(), 0);
    finish(&mut grid);
    grid.tick(60.0);
    assert_eq!(state(&grid), LastLayerState::Damaged);

    assert_eq!(grid.replace_battery(0, 0), Ok(true));
    assert_eq!(state(&grid), LastLayerState::Complete);
    assert_eq!(grid.get_quadrant(0, 0).unwrap().battery_level(), 100.0);

    grid.set_last_layer_state(0, 0, LastLayerState::Destroyed)
        .unwrap();
    let drained = grid.get_quadrant(0, 0).unwrap().battery_level();
    assert_eq!(grid.replace_battery(0, 0), Ok(false));
    assert_eq!(state(&grid), LastLayerState::Destroyed);
    assert_eq!(grid.get_quadrant(0, 0).unwrap().battery_level(), drained);
}

#[test]
fn replace_batteries_effect_touches_only_futuristic_cells() {
    let config = GridConfig::single_era(2, 1, EraVariant::Futuristic)
        .with_era_at(1, 0, EraVariant::Medieval);
    let mut grid = GridBuilder::new(config).build().unwrap();
    grid.apply_effect(GridEffect::CompleteAll);
    grid.tick(70.0);
    assert_eq!(
        grid.get_quadrant(0, 0).unwrap().last_layer_state(),
        LastLayerState::Damaged
    );

    let report = grid.apply_effect(GridEffect::ReplaceBatteries);
    assert_eq!(report.failed, 0);
    assert_eq!(
        grid.get_quadrant(0, 0).unwrap().last_layer_state(),
        LastLayerState::Complete
    );
    assert_eq!(
        grid.get_quadrant(1, 0).unwrap().last_layer_state(),
        LastLayerState::Complete
    );
}
