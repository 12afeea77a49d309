use chrono::{Datelike, NaiveDate};

use crate::calendar::Calendar;
use crate::catalog::RegionKind;
use crate::rng::{week_rng, RngExt};

use super::{
    EnvironmentProvider, ProviderError, VegetationPhase, WeatherSource, WeeklyEnvironment, MAX_ET_MM,
    MAX_RAIN_MM,
};

/// Deterministic synthetic weather. Each (seed, region, week) has its own stream.
#[derive(Debug, Clone)]
pub struct SeededWeather {
    seed: u64,
    calendar: Calendar,
}

impl SeededWeather {
    pub fn new(seed: u64, start_date: NaiveDate) -> Self {
        Self {
            seed,
            calendar: Calendar::new(start_date),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generate(&self, region: RegionKind, week: u32) -> WeeklyEnvironment {
        let profile = region.profile();
        let day_of_year = self.calendar.date_for_week(week).ordinal();
        let factor = seasonal_factor(day_of_year, profile.latitude_deg);

        let mut rng = week_rng(self.seed, region.index(), week);
        let rain = factor * rng.uniform(profile.rain_mm.0, profile.rain_mm.1);
        let et = factor * rng.uniform(profile.et_mm.0, profile.et_mm.1);

        WeeklyEnvironment {
            rain_mm: rain.clamp(0.0, MAX_RAIN_MM),
            et_mm: et.clamp(0.0, MAX_ET_MM),
            phase: phenology(day_of_year, profile.latitude_deg),
        }
    }
}

impl EnvironmentProvider for SeededWeather {
    fn weekly_environment(&mut self, region: RegionKind, week: u32) -> WeeklyEnvironment {
        self.generate(region, week)
    }
}

impl WeatherSource for SeededWeather {
    fn name(&self) -> &str {
        "seeded"
    }

    fn fetch(&self, region: RegionKind, week: u32) -> Result<WeeklyEnvironment, ProviderError> {
        Ok(self.generate(region, week))
    }
}

/// Noon solar elevation proxy, floored so winter weeks still see some weather.
fn seasonal_factor(day_of_year: u32, latitude_deg: f64) -> f64 {
    let declination =
        23.45 * (2.0 * std::f64::consts::PI * (284.0 + f64::from(day_of_year)) / 365.0).sin();
    let (lat, decl) = (latitude_deg.to_radians(), declination.to_radians());
    let angle = lat.sin() * decl.sin() + lat.cos() * decl.cos();
    angle.max(0.1)
}

fn phenology(day_of_year: u32, latitude_deg: f64) -> VegetationPhase {
    let day = if latitude_deg >= 0.0 {
        day_of_year
    } else {
        (day_of_year + 182) % 365
    };
    match day {
        d if d < 60 || d > 300 => VegetationPhase::Dormant,
        d if d < 120 => VegetationPhase::GreenUp,
        d if d < 240 => VegetationPhase::Peak,
        _ => VegetationPhase::Senescence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::default_start_date;

    #[test]
    fn same_week_same_weather() {
        let weather = SeededWeather::new(99, default_start_date());
        let first = weather.generate(RegionKind::SemiAridSteppe, 5);
        let _ = weather.generate(RegionKind::SemiAridSteppe, 6);
        assert_eq!(first, weather.generate(RegionKind::SemiAridSteppe, 5));
    }

    #[test]
    fn values_stay_in_bounds() {
        let weather = SeededWeather::new(3, default_start_date());
        for region in RegionKind::ALL {
            for week in 0..60 {
                let env = weather.generate(region, week);
                assert!((0.0..=MAX_RAIN_MM).contains(&env.rain_mm));
                assert!((0.0..=MAX_ET_MM).contains(&env.et_mm));
            }
        }
    }

    #[test]
    fn northern_phenology_follows_day_of_year() {
        assert_eq!(phenology(10, 1.5), VegetationPhase::Dormant);
        assert_eq!(phenology(61, 1.5), VegetationPhase::GreenUp);
        assert_eq!(phenology(150, 1.5), VegetationPhase::Peak);
        assert_eq!(phenology(250, 1.5), VegetationPhase::Senescence);
        assert_eq!(phenology(320, 1.5), VegetationPhase::Dormant);
    }

    #[test]
    fn southern_phenology_is_shifted() {
        // Day 150 is late autumn in the south.
        assert_eq!(phenology(150, -35.3), VegetationPhase::Dormant);
        assert_eq!(phenology(300, -35.3), VegetationPhase::GreenUp);
    }

    #[test]
    fn seasonal_factor_has_a_floor() {
        assert!(seasonal_factor(355, -89.0) >= 0.1);
        assert!(seasonal_factor(172, 1.5) > 0.9);
    }
}
