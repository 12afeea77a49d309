//! Weekly environmental inputs and the providers that produce them.
//!
//! The engine only sees [`EnvironmentProvider`], which never fails. Data sources
//! that can fail implement [`WeatherSource`] and are wrapped in a
//! [`FallbackProvider`], which substitutes [`SeededWeather`] on error.

mod fallback;
mod recorded;
mod seeded;

pub use fallback::{DataOrigin, FallbackProvider};
pub use recorded::{RecordedSeries, RecordedWeek};
pub use seeded::SeededWeather;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::RegionKind;

/// Upper bound on weekly rainfall any provider may report.
pub const MAX_RAIN_MM: f64 = 200.0;
/// Upper bound on weekly evapotranspiration any provider may report.
pub const MAX_ET_MM: f64 = 50.0;

/// Vegetation-index phase reported for a week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VegetationPhase {
    #[default]
    Dormant,
    GreenUp,
    Peak,
    Senescence,
}

impl VegetationPhase {
    /// Phases during which a fertilizer dose counts toward the split bonus.
    pub fn is_active(self) -> bool {
        matches!(self, VegetationPhase::GreenUp | VegetationPhase::Peak)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyEnvironment {
    pub rain_mm: f64,
    pub et_mm: f64,
    pub phase: VegetationPhase,
}

impl WeeklyEnvironment {
    pub fn new(rain_mm: f64, et_mm: f64, phase: VegetationPhase) -> Self {
        Self {
            rain_mm,
            et_mm,
            phase,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no recorded weather for {region} week {week}")]
    MissingWeek { region: RegionKind, week: u32 },
    #[error("{field} {value} for {region} week {week} is outside 0..={max}")]
    OutOfRange {
        region: RegionKind,
        week: u32,
        field: &'static str,
        value: f64,
        max: f64,
    },
    #[error("weather source unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read weather data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse weather data: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Supplies the engine with one environment per region and week. Must not fail.
pub trait EnvironmentProvider: Send {
    fn weekly_environment(&mut self, region: RegionKind, week: u32) -> WeeklyEnvironment;
}

impl<F> EnvironmentProvider for F
where
    F: FnMut(RegionKind, u32) -> WeeklyEnvironment + Send,
{
    fn weekly_environment(&mut self, region: RegionKind, week: u32) -> WeeklyEnvironment {
        self(region, week)
    }
}

/// A data source that may be unavailable or incomplete.
pub trait WeatherSource: Send {
    fn name(&self) -> &str;
    fn fetch(&self, region: RegionKind, week: u32) -> Result<WeeklyEnvironment, ProviderError>;
}
