use std::sync::{Arc, Mutex};

use agroturn::{
    balance::BalanceParameters,
    catalog::{CropCatalog, CropDefinition, RegionKind},
    environment::{VegetationPhase, WeeklyEnvironment},
    observer::{Cue, RecordingObserver},
    scoring::harvest_value,
    EngineBuilder, GameMode, Phase, TurnEngine,
};

fn calm(_: RegionKind, _: u32) -> WeeklyEnvironment {
    WeeklyEnvironment::new(0.0, 0.0, VegetationPhase::GreenUp)
}

fn fixed_engine(weeks: u32) -> TurnEngine {
    EngineBuilder::new(GameMode::FixedSeason { total_weeks: weeks }, calm)
        .build()
        .expect("engine builds")
}

fn test_catalog() -> CropCatalog {
    let crop = CropDefinition {
        planting_cost: 15,
        base_weekly_growth: 10.0,
        optimal_soil_water: 0.6,
        maturity_target: 500.0,
        ..CropDefinition::new("test", "Test Crop")
    };
    CropCatalog::new(vec![crop]).expect("catalog is valid")
}

fn turn(engine: &mut TurnEngine) {
    assert!(engine.end_planning_and_resolve());
    assert!(engine.next_week());
}

#[test]
fn soil_fraction_stays_in_unit_interval() {
    let swings = |_: RegionKind, week: u32| {
        if week % 2 == 0 {
            WeeklyEnvironment::new(200.0, 0.0, VegetationPhase::Peak)
        } else {
            WeeklyEnvironment::new(0.0, 50.0, VegetationPhase::Senescence)
        }
    };
    let balance = BalanceParameters {
        starting_gold: 1_000,
        ..BalanceParameters::default()
    };
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 20 }, swings)
        .balance(balance)
        .build()
        .unwrap();

    for _ in 0..20 {
        for _ in 0..3 {
            engine.queue_irrigation(0);
        }
        engine.end_planning_and_resolve();
        for plot in engine.snapshot().plots {
            assert!(
                (0.0..=1.0).contains(&plot.soil_fraction),
                "soil fraction {} out of range",
                plot.soil_fraction
            );
        }
        engine.next_week();
    }
    assert_eq!(engine.phase(), Phase::Harvest);
}

#[test]
fn three_irrigations_queue_diminishing_water() {
    let mut engine = fixed_engine(4);
    for _ in 0..3 {
        assert!(engine.queue_irrigation(0));
    }
    let snapshot = engine.snapshot();
    let plot = snapshot.plot(0).unwrap();
    assert!((plot.pending_irrigation_mm - 21.0).abs() < 1e-9);
    assert!((plot.irrigation_mm_this_week - 21.0).abs() < 1e-9);
    assert_eq!(plot.irrigation_events_this_week, 3);
    assert_eq!(plot.soil_fraction, 0.6);
    assert_eq!(snapshot.gold, 45);
}

#[test]
fn irrigation_counters_reset_each_week() {
    let mut engine = fixed_engine(4);
    engine.queue_irrigation(0);
    engine.queue_irrigation(0);
    turn(&mut engine);
    let snapshot = engine.snapshot();
    let plot = snapshot.plot(0).unwrap();
    assert_eq!(plot.irrigation_events_this_week, 0);
    assert_eq!(plot.pending_irrigation_mm, 0.0);
    assert!(engine.queue_irrigation(0));
    let pending = engine.snapshot().plot(0).unwrap().pending_irrigation_mm;
    assert!((pending - 10.0).abs() < 1e-9);
}

#[test]
fn leaching_is_charged_at_the_following_week_boundary() {
    let flood_then_calm = |_: RegionKind, week: u32| {
        if week == 0 {
            WeeklyEnvironment::new(200.0, 0.0, VegetationPhase::GreenUp)
        } else {
            WeeklyEnvironment::new(0.0, 0.0, VegetationPhase::GreenUp)
        }
    };
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 6 }, flood_then_calm)
        .build()
        .unwrap();
    turn(&mut engine);
    assert_eq!(engine.farm().selected().unwrap().soil_fraction, 1.0);

    assert!(engine.plant_crop("rice"));
    assert!(engine.apply_nitrogen(agroturn::plot::NitrogenPart::A));
    assert_eq!(engine.gold(), 60 - 15 - 8);
    assert_eq!(engine.snapshot().plot(0).unwrap().pending_leach_penalty, 5);

    assert!(engine.end_planning_and_resolve());
    assert_eq!(engine.gold(), 37, "leaching must not be charged during the resolve");

    assert!(engine.next_week());
    assert_eq!(engine.gold(), 32);
    assert_eq!(engine.snapshot().plot(0).unwrap().pending_leach_penalty, 0);
}

#[test]
fn runoff_is_charged_during_the_resolve() {
    let wet = |_: RegionKind, _: u32| WeeklyEnvironment::new(120.0, 0.0, VegetationPhase::Peak);
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 6 }, wet)
        .build()
        .unwrap();
    turn(&mut engine);
    assert_eq!(engine.gold(), 60);

    engine.end_planning_and_resolve();
    // Both plots start the week saturated.
    assert_eq!(engine.gold(), 54);
    let report = engine.last_report().unwrap();
    assert_eq!(report.runoff_count(), 2);
    assert_eq!(report.gold_delta, -6);
    assert_eq!(engine.snapshot().plot(1).unwrap().runoff_event_count, 1);
}

#[test]
fn poor_crop_fails_after_max_age_and_refunds_half() {
    let recorder = Arc::new(Mutex::new(RecordingObserver::default()));
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 30 }, calm)
        .with_observer(recorder.clone())
        .build()
        .unwrap();
    // Wheat is poorly suited to the monsoon and lives 16 weeks.
    assert!(engine.plant_crop("wheat"));
    assert_eq!(engine.gold(), 46);

    for _ in 0..16 {
        turn(&mut engine);
    }
    assert!(engine.farm().selected().unwrap().crop.is_some());

    engine.end_planning_and_resolve();
    let report = engine.last_report().unwrap();
    let outcome = report.outcome(RegionKind::TropicalMonsoon, 0).unwrap();
    assert_eq!(outcome.failed_crop.as_deref(), Some("wheat"));
    assert_eq!(outcome.refund, 7);
    assert_eq!(engine.gold(), 53);
    assert!(engine.farm().selected().unwrap().is_empty());
    assert_eq!(engine.snapshot().plot(0).unwrap().accumulated_growth, 0.0);

    let recorder = recorder.lock().unwrap();
    assert!(recorder.cues.contains(&Cue::CropFailed {
        region: RegionKind::TropicalMonsoon,
        plot: 0,
        crop: "wheat".into(),
    }));
}

fn phased(_: RegionKind, week: u32) -> WeeklyEnvironment {
    let phase = match week {
        0 => VegetationPhase::Dormant,
        1 => VegetationPhase::GreenUp,
        _ => VegetationPhase::Peak,
    };
    WeeklyEnvironment::new(0.0, 0.0, phase)
}

fn split_engine() -> TurnEngine {
    EngineBuilder::new(GameMode::FixedSeason { total_weeks: 10 }, phased)
        .catalog(test_catalog())
        .build()
        .unwrap()
}

fn growth_of_plot_zero(engine: &TurnEngine) -> f64 {
    engine
        .last_report()
        .and_then(|report| report.outcome(RegionKind::TropicalMonsoon, 0))
        .map(|outcome| outcome.growth)
        .unwrap()
}

#[test]
fn split_nitrogen_in_two_active_weeks_earns_the_bonus() {
    let mut engine = split_engine();
    turn(&mut engine);
    assert!(engine.plant_crop("test"));
    assert!(engine.apply_nitrogen(agroturn::plot::NitrogenPart::A));
    turn(&mut engine);
    assert!(engine.apply_nitrogen(agroturn::plot::NitrogenPart::B));
    engine.end_planning_and_resolve();
    // 10 * peak 1.1 * bonus 1.1
    assert!((growth_of_plot_zero(&engine) - 12.1).abs() < 1e-9);
}

#[test]
fn split_nitrogen_in_one_week_earns_nothing() {
    let mut engine = split_engine();
    turn(&mut engine);
    engine.plant_crop("test");
    engine.apply_nitrogen(agroturn::plot::NitrogenPart::A);
    engine.apply_nitrogen(agroturn::plot::NitrogenPart::B);
    turn(&mut engine);
    engine.end_planning_and_resolve();
    assert!((growth_of_plot_zero(&engine) - 11.0).abs() < 1e-9);
}

#[test]
fn split_nitrogen_during_dormancy_earns_nothing() {
    let mut engine = split_engine();
    engine.plant_crop("test");
    engine.apply_nitrogen(agroturn::plot::NitrogenPart::A);
    turn(&mut engine);
    engine.apply_nitrogen(agroturn::plot::NitrogenPart::B);
    turn(&mut engine);
    engine.end_planning_and_resolve();
    assert!((growth_of_plot_zero(&engine) - 11.0).abs() < 1e-9);
}

#[test]
fn nitrogen_part_cannot_be_applied_twice() {
    let mut engine = fixed_engine(4);
    engine.plant_crop("rice");
    assert!(engine.apply_nitrogen(agroturn::plot::NitrogenPart::A));
    let gold = engine.gold();
    assert!(!engine.apply_nitrogen(agroturn::plot::NitrogenPart::A));
    assert_eq!(engine.gold(), gold);
}

#[test]
fn plot_prices_grow_geometrically() {
    let balance = BalanceParameters {
        starting_gold: 200,
        ..BalanceParameters::default()
    };
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 4 }, calm)
        .balance(balance)
        .build()
        .unwrap();
    assert_eq!(engine.next_plot_cost(), Some(60));
    assert!(engine.buy_new_plot());
    assert_eq!(engine.gold(), 140);
    assert_eq!(engine.next_plot_cost(), Some(75));
    assert!(engine.farm().active_economy().unwrap().is_unlocked(2));
    assert!(engine.buy_new_plot());
    assert_eq!(engine.gold(), 65);
}

#[test]
fn unaffordable_plot_changes_nothing() {
    let mut engine = fixed_engine(4);
    engine.plant_crop("rice");
    let before = engine.save_state();
    assert!(!engine.buy_new_plot());
    assert_eq!(engine.save_state(), before);
}

#[test]
fn planning_commands_are_no_ops_after_the_resolve() {
    let mut engine = fixed_engine(4);
    engine.plant_crop("rice");
    assert!(engine.end_planning_and_resolve());
    let before = engine.save_state();

    assert!(!engine.queue_irrigation(0));
    assert!(engine.select_plot(1));
    assert!(!engine.plant_crop("maize"));
    assert!(engine.select_plot(0));
    assert!(!engine.apply_nitrogen(agroturn::plot::NitrogenPart::A));
    assert!(!engine.apply_nitrogen(agroturn::plot::NitrogenPart::B));
    assert!(!engine.buy_new_plot());
    assert!(!engine.unlock_plot(4));
    assert!(!engine.end_planning_and_resolve());

    assert_eq!(engine.save_state(), before);
    assert_eq!(engine.phase(), Phase::End);
}

#[test]
fn invalid_targets_are_rejected() {
    let mut engine = fixed_engine(4);
    assert!(!engine.select_plot(5));
    assert!(!engine.queue_irrigation(7));
    assert!(!engine.plant_crop("cassava"));
    assert!(!engine.next_week());
    assert!(!engine.unlock_plot(9));
    assert_eq!(engine.gold(), 60);
    assert_eq!(engine.farm().selected_plot(), 0);
}

#[test]
fn harvest_score_adds_rounded_growth_to_gold() {
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 3 }, phased)
        .catalog(test_catalog())
        .build()
        .unwrap();
    engine.plant_crop("test");
    engine.select_plot(1);
    engine.plant_crop("test");
    engine.queue_irrigation(1);
    for _ in 0..3 {
        turn(&mut engine);
    }
    assert_eq!(engine.phase(), Phase::Harvest);

    let expected_harvest: i64 = engine
        .farm()
        .active_economy()
        .unwrap()
        .plots()
        .map(harvest_value)
        .sum();
    let score = engine.harvest_score().cloned().unwrap();
    assert_eq!(score.harvest_gold, expected_harvest);
    assert_eq!(score.remaining_gold, engine.gold());
    assert_eq!(score.final_score, expected_harvest + engine.gold());
    assert_eq!(score.yields.len(), 2);

    assert_eq!(engine.harvest_score(), Some(&score));
    assert_eq!(engine.snapshot().harvest, Some(score));
}

#[test]
fn restart_returns_to_a_fresh_season() {
    let mut engine = fixed_engine(2);
    engine.plant_crop("rice");
    turn(&mut engine);
    turn(&mut engine);
    assert_eq!(engine.phase(), Phase::Harvest);

    assert!(engine.restart());
    assert_eq!(engine.phase(), Phase::Planning);
    assert_eq!(engine.week_index(), 0);
    assert_eq!(engine.gold(), 60);
    assert!(engine.harvest_score().is_none());
    assert!(engine.snapshot().plots.iter().all(|plot| plot.crop.is_none()));
}

#[test]
fn observers_see_every_transition_and_commit() {
    let recorder = Arc::new(Mutex::new(RecordingObserver::default()));
    let mut engine = EngineBuilder::new(GameMode::FixedSeason { total_weeks: 2 }, calm)
        .with_observer(recorder.clone())
        .build()
        .unwrap();
    engine.plant_crop("rice");
    turn(&mut engine);
    turn(&mut engine);

    let recorder = recorder.lock().unwrap();
    assert_eq!(
        recorder.transitions,
        vec![
            (Phase::Planning, Phase::Resolving),
            (Phase::Resolving, Phase::End),
            (Phase::End, Phase::Planning),
            (Phase::Planning, Phase::Resolving),
            (Phase::Resolving, Phase::End),
            (Phase::End, Phase::Harvest),
        ]
    );
    assert_eq!(recorder.commits, vec![1, 2]);
    assert!(matches!(recorder.cues.first(), Some(Cue::Planted { plot: 0, .. })));
}
