use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::RegionKind;

use super::{EnvironmentProvider, SeededWeather, WeatherSource, WeeklyEnvironment};

/// Which source produced a week's environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Source,
    Fallback,
}

/// Wraps a fallible source. Failures are logged and replaced by seeded weather;
/// every answer is memoized per (region, week).
pub struct FallbackProvider<S> {
    source: S,
    fallback: SeededWeather,
    cache: HashMap<(RegionKind, u32), (WeeklyEnvironment, DataOrigin)>,
}

impl<S: WeatherSource> FallbackProvider<S> {
    pub fn new(source: S, fallback: SeededWeather) -> Self {
        Self {
            source,
            fallback,
            cache: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Origin of a week that has already been served.
    pub fn origin(&self, region: RegionKind, week: u32) -> Option<DataOrigin> {
        self.cache.get(&(region, week)).map(|(_, origin)| *origin)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn resolve(&self, region: RegionKind, week: u32) -> (WeeklyEnvironment, DataOrigin) {
        match self.source.fetch(region, week) {
            Ok(env) => (env, DataOrigin::Source),
            Err(err) => {
                warn!(
                    source = self.source.name(),
                    %region,
                    week,
                    error = %err,
                    "weather source failed, using seeded fallback"
                );
                (self.fallback.generate(region, week), DataOrigin::Fallback)
            }
        }
    }
}

impl<S: WeatherSource> EnvironmentProvider for FallbackProvider<S> {
    fn weekly_environment(&mut self, region: RegionKind, week: u32) -> WeeklyEnvironment {
        if let Some((env, _)) = self.cache.get(&(region, week)) {
            return *env;
        }
        let resolved = self.resolve(region, week);
        self.cache.insert((region, week), resolved);
        resolved.0
    }
}
