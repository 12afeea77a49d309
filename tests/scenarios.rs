use std::path::PathBuf;

use agroturn::{
    catalog::RegionKind,
    environment::VegetationPhase,
    runner::{self, CommandScript},
    scenario::ScenarioLoader,
    GameMode, Phase,
};

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn loader() -> ScenarioLoader {
    ScenarioLoader::new(manifest_dir())
}

#[test]
fn monsoon_season_plays_to_harvest() {
    let scenario = loader()
        .load("scenarios/monsoon_season.yaml")
        .expect("scenario should load");
    assert_eq!(scenario.mode, GameMode::FixedSeason { total_weeks: 8 });
    let script = CommandScript::load(manifest_dir().join("scripts/monsoon_rice.yaml"))
        .expect("script should load");

    let mut engine = scenario.engine_builder().unwrap().build().unwrap();
    let mut weeks_seen = Vec::new();
    let summary = runner::run_with_hook(&mut engine, &script, scenario.weeks(None), |snapshot| {
        weeks_seen.push(snapshot.week_index)
    });

    assert_eq!(summary.weeks_played, 8);
    assert_eq!(weeks_seen, (1..=8).collect::<Vec<_>>());
    assert_eq!(engine.phase(), Phase::Harvest);
    let harvest = summary.harvest.expect("season should be scored");
    assert!(harvest.harvest_gold > 0);
    assert_eq!(harvest.final_score, harvest.harvest_gold + summary.gold);
    assert!(summary.accepted_commands >= 3);
}

#[test]
fn seeded_runs_are_reproducible() {
    let scenario = loader().load("scenarios/monsoon_season.yaml").unwrap();
    let script = CommandScript::load(manifest_dir().join("scripts/monsoon_rice.yaml")).unwrap();

    let play = || {
        let mut engine = scenario.engine_builder().unwrap().build().unwrap();
        runner::run(&mut engine, &script, 8);
        serde_json::to_string(&engine.save_state()).unwrap()
    };
    assert_eq!(play(), play());
}

#[test]
fn runs_stop_early_when_asked() {
    let scenario = loader().load("scenarios/monsoon_season.yaml").unwrap();
    let mut engine = scenario.engine_builder().unwrap().build().unwrap();
    let summary = runner::run(&mut engine, &CommandScript::default(), scenario.weeks(Some(3)));
    assert_eq!(summary.weeks_played, 3);
    assert_eq!(summary.final_week, 3);
    assert!(summary.harvest.is_none());
    assert_eq!(engine.phase(), Phase::Planning);
}

#[test]
fn recorded_weather_is_used_where_present() {
    let scenario = loader().load("scenarios/recorded_steppe.yaml").unwrap();
    assert_eq!(scenario.balance.starting_gold, 80);
    assert_eq!(scenario.balance.runoff_penalty, 4);
    assert_eq!(scenario.balance.irrigation_cost, 5);

    let mut engine = scenario.engine_builder().unwrap().build().unwrap();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.active_region, RegionKind::SemiAridSteppe);
    assert_eq!(snapshot.environment.rain_mm, 4.0);
    assert_eq!(snapshot.environment.et_mm, 18.0);
    assert_eq!(snapshot.environment.phase, VegetationPhase::GreenUp);
    assert!(engine.catalog().get("rice").is_none());

    // Weeks 4 and 5 are not recorded and fall back to seeded weather.
    let summary = runner::run(&mut engine, &CommandScript::default(), scenario.weeks(None));
    assert_eq!(summary.weeks_played, 6);
    assert_eq!(engine.phase(), Phase::Harvest);
}

#[test]
fn endless_fixture_overrides_balance() {
    let scenario = loader().load("scenarios/endless.yaml").unwrap();
    assert_eq!(scenario.mode, GameMode::Endless);
    assert_eq!(scenario.weeks(None), 52);
    let engine = scenario.engine_builder().unwrap().build().unwrap();
    assert_eq!(engine.gold(), 120);
    assert_eq!(engine.snapshot().regions.len(), 3);
}

#[test]
fn missing_scenario_reports_the_path() {
    let err = loader().load("scenarios/nope.yaml").unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to read scenario file"));
    assert!(message.contains("nope.yaml"));
}

#[test]
fn invalid_balance_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bad.yaml"),
        "name: bad\nseed: 1\nbalance:\n  second_irrigation_efficiency: 1.5\n",
    )
    .unwrap();
    let err = ScenarioLoader::new(dir.path()).load("bad.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("second_irrigation_efficiency"));
}
