use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::RegionKind;

use super::{
    ProviderError, VegetationPhase, WeatherSource, WeeklyEnvironment, MAX_ET_MM, MAX_RAIN_MM,
};

/// One observed week as stored in a weather file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedWeek {
    pub week: u32,
    pub rain_mm: f64,
    pub et_mm: f64,
    #[serde(default)]
    pub phase: VegetationPhase,
}

/// Observed weather keyed by region and week, loaded from YAML.
#[derive(Debug, Clone, Default)]
pub struct RecordedSeries {
    name: String,
    weeks: HashMap<(RegionKind, u32), WeeklyEnvironment>,
}

impl RecordedSeries {
    pub fn from_yaml_str(name: impl Into<String>, text: &str) -> Result<Self, ProviderError> {
        let table: BTreeMap<RegionKind, Vec<RecordedWeek>> = serde_yaml::from_str(text)?;
        let mut series = Self {
            name: name.into(),
            weeks: HashMap::new(),
        };
        for (region, weeks) in table {
            for row in weeks {
                series.insert(
                    region,
                    row.week,
                    WeeklyEnvironment::new(row.rain_mm, row.et_mm, row.phase),
                )?;
            }
        }
        Ok(series)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(path.display().to_string(), &text)
    }

    /// Adds one observed week. Rain and ET outside the provider bounds are rejected.
    pub fn insert(
        &mut self,
        region: RegionKind,
        week: u32,
        environment: WeeklyEnvironment,
    ) -> Result<(), ProviderError> {
        let out_of_range = |field, value: f64, max| {
            (!(0.0..=max).contains(&value)).then_some(ProviderError::OutOfRange {
                region,
                week,
                field,
                value,
                max,
            })
        };
        if let Some(err) = out_of_range("rain_mm", environment.rain_mm, MAX_RAIN_MM)
            .or_else(|| out_of_range("et_mm", environment.et_mm, MAX_ET_MM))
        {
            return Err(err);
        }
        self.weeks.insert((region, week), environment);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

impl WeatherSource for RecordedSeries {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, region: RegionKind, week: u32) -> Result<WeeklyEnvironment, ProviderError> {
        self.weeks
            .get(&(region, week))
            .copied()
            .ok_or(ProviderError::MissingWeek { region, week })
    }
}
