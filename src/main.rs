use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agroturn::{
    runner::{self, CommandScript},
    save::SaveStore,
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Turn-based farm simulation runner")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Play a scenario headless, optionally following a command script
    Run {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/monsoon_season.yaml")]
        scenario: PathBuf,

        /// Weeks to play (uses the scenario's length when omitted)
        #[arg(long)]
        weeks: Option<u32>,

        /// YAML list of commands per week
        #[arg(long)]
        script: Option<PathBuf>,

        /// Write the final state here as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Serve the engine over HTTP with a server-sent event stream
    Serve {
        #[arg(long, default_value = "scenarios/endless.yaml")]
        scenario: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Save file to resume from and autosave to
        #[arg(long)]
        save: Option<PathBuf>,

        /// Autosave interval in weeks, 0 to disable
        #[arg(long, default_value_t = 1)]
        autosave_weeks: u32,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");

    match cli.command {
        Mode::Run {
            scenario,
            weeks,
            script,
            save,
        } => {
            let scenario = loader.load(&scenario)?;
            let script = match script {
                Some(path) => CommandScript::load(path)?,
                None => CommandScript::default(),
            };
            let mut engine = scenario.engine_builder()?.build()?;
            let weeks = scenario.weeks(weeks);
            let summary = runner::run(&mut engine, &script, weeks);

            if let Some(path) = save {
                SaveStore::new(&path)
                    .save(&engine.save_state())
                    .with_context(|| format!("Failed to write save {}", path.display()))?;
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Mode::Serve {
            scenario,
            host,
            port,
            save,
            autosave_weeks,
        } => {
            let scenario = loader.load(&scenario)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::run(WebServerConfig {
                scenario,
                host,
                port,
                save_path: save,
                autosave_weeks,
            }))
        }
    }
}
