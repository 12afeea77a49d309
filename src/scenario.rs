use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    balance::BalanceParameters,
    calendar::default_start_date,
    catalog::{CropCatalog, CropDefinition, RegionKind},
    engine::EngineBuilder,
    environment::{FallbackProvider, RecordedSeries, SeededWeather},
    world::GameMode,
};

fn default_mode() -> GameMode {
    GameMode::FixedSeason { total_weeks: 12 }
}

fn default_starting_region() -> RegionKind {
    RegionKind::TropicalMonsoon
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum WeatherConfig {
    #[default]
    Seeded,
    /// Observed weeks from a YAML table; gaps fall back to seeded weather.
    Recorded { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_mode")]
    pub mode: GameMode,
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_starting_region")]
    pub starting_region: RegionKind,
    /// Weeks to play; fixed seasons default to their length.
    #[serde(default)]
    pub weeks: Option<u32>,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub balance: BalanceParameters,
    #[serde(default)]
    pub crops: Option<Vec<CropDefinition>>,
    #[serde(skip)]
    base_dir: PathBuf,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        scenario
            .balance
            .validate()
            .with_context(|| format!("Invalid balance in {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn catalog(&self) -> Result<CropCatalog> {
        match &self.crops {
            Some(crops) => CropCatalog::new(crops.clone())
                .with_context(|| format!("Invalid crop catalog in scenario '{}'", self.name)),
            None => Ok(CropCatalog::default()),
        }
    }

    /// Builder with mode, balance, catalog and weather wired from the file.
    pub fn engine_builder(&self) -> Result<EngineBuilder> {
        let seeded = SeededWeather::new(self.seed, self.start_date);
        let builder = match &self.weather {
            WeatherConfig::Seeded => EngineBuilder::new(self.mode, seeded),
            WeatherConfig::Recorded { path } => {
                let path = self.base_dir.join(path);
                let series = RecordedSeries::load(&path)
                    .with_context(|| format!("Failed to load weather from {}", path.display()))?;
                EngineBuilder::new(self.mode, FallbackProvider::new(series, seeded))
            }
        };
        Ok(builder
            .balance(self.balance.clone())
            .catalog(self.catalog()?)
            .start_date(self.start_date)
            .starting_region(self.starting_region))
    }

    pub fn weeks(&self, override_weeks: Option<u32>) -> u32 {
        let season = match self.mode {
            GameMode::FixedSeason { total_weeks } => Some(total_weeks),
            GameMode::Endless => None,
        };
        override_weeks.or(self.weeks).or(season).unwrap_or(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_scenario_uses_defaults() {
        let scenario: Scenario = serde_yaml::from_str("name: tiny\nseed: 1\n").unwrap();
        assert_eq!(scenario.mode, GameMode::FixedSeason { total_weeks: 12 });
        assert_eq!(scenario.start_date, default_start_date());
        assert_eq!(scenario.weeks(None), 12);
        assert_eq!(scenario.weeks(Some(3)), 3);
        assert!(matches!(scenario.weather, WeatherConfig::Seeded));
        assert_eq!(scenario.catalog().unwrap().len(), 4);
    }

    #[test]
    fn endless_scenario_parses_mode_tag() {
        let yaml = "name: forever\nseed: 9\nmode:\n  kind: endless\nweeks: 30\nstarting_region: semi_arid_steppe\n";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.mode, GameMode::Endless);
        assert_eq!(scenario.starting_region, RegionKind::SemiAridSteppe);
        assert_eq!(scenario.weeks(None), 30);
    }
}
