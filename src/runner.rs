//! Headless play-through driven by a scripted list of commands per week.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    engine::{Command, TurnEngine},
    scoring::HarvestScore,
    snapshot::EngineSnapshot,
    world::Phase,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptWeek {
    pub week: u32,
    #[serde(default)]
    pub commands: Vec<Command>,
}

/// Commands to issue during the planning phase of given weeks. Weeks with no
/// entry simply end their turn.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandScript {
    #[serde(default)]
    pub weeks: Vec<ScriptWeek>,
}

impl CommandScript {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read command script {}", path.display()))?;
        serde_yaml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn commands_for(&self, week: u32) -> impl Iterator<Item = &Command> {
        self.weeks
            .iter()
            .filter(move |entry| entry.week == week)
            .flat_map(|entry| entry.commands.iter())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub weeks_played: u32,
    pub final_week: u32,
    pub gold: i64,
    pub accepted_commands: usize,
    pub rejected_commands: usize,
    pub harvest: Option<HarvestScore>,
}

pub fn run(engine: &mut TurnEngine, script: &CommandScript, weeks: u32) -> RunSummary {
    run_with_hook(engine, script, weeks, |_| {})
}

/// Plays up to `weeks` turns, calling `hook` with a snapshot after each week advances.
pub fn run_with_hook<F>(
    engine: &mut TurnEngine,
    script: &CommandScript,
    weeks: u32,
    mut hook: F,
) -> RunSummary
where
    F: FnMut(&EngineSnapshot),
{
    let mut weeks_played = 0;
    let mut accepted = 0;
    let mut rejected = 0;

    while weeks_played < weeks && engine.phase() != Phase::Harvest {
        let week = engine.week_index();
        for command in script.commands_for(week) {
            if engine.apply(command.clone()) {
                accepted += 1;
            } else {
                warn!(week, ?command, "scripted command rejected");
                rejected += 1;
            }
        }
        // Finish the turn unless the script already moved past this week.
        if engine.week_index() == week {
            if engine.phase() == Phase::Planning {
                engine.end_planning_and_resolve();
            }
            if engine.phase() == Phase::End {
                engine.next_week();
            }
        }
        weeks_played += 1;
        hook(&engine.snapshot());
    }

    let summary = RunSummary {
        weeks_played,
        final_week: engine.week_index(),
        gold: engine.gold(),
        accepted_commands: accepted,
        rejected_commands: rejected,
        harvest: engine.harvest_score().cloned(),
    };
    info!(
        weeks = summary.weeks_played,
        gold = summary.gold,
        rejected = summary.rejected_commands,
        "run finished"
    );
    summary
}
