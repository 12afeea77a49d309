use serde::{Deserialize, Serialize};

use crate::catalog::RegionKind;

/// What happened to one plot during a resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotOutcome {
    pub region: RegionKind,
    pub plot: usize,
    pub water_in_mm: f64,
    pub water_out_mm: f64,
    pub soil_fraction_before: f64,
    pub soil_fraction_after: f64,
    pub runoff: bool,
    pub growth: f64,
    pub failed_crop: Option<String>,
    pub refund: i64,
    pub matured: bool,
}

impl PlotOutcome {
    fn empty(region: RegionKind, plot: usize) -> Self {
        Self {
            region,
            plot,
            water_in_mm: 0.0,
            water_out_mm: 0.0,
            soil_fraction_before: 0.0,
            soil_fraction_after: 0.0,
            runoff: false,
            growth: 0.0,
            failed_crop: None,
            refund: 0,
            matured: false,
        }
    }
}

/// Summary of one `end_planning_and_resolve`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub week: u32,
    pub outcomes: Vec<PlotOutcome>,
    pub gold_delta: i64,
}

impl ResolutionReport {
    pub fn new(week: u32) -> Self {
        Self {
            week,
            ..Self::default()
        }
    }

    pub fn outcome(&self, region: RegionKind, plot: usize) -> Option<&PlotOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.region == region && outcome.plot == plot)
    }

    pub(crate) fn outcome_mut(&mut self, region: RegionKind, plot: usize) -> &mut PlotOutcome {
        let position = self
            .outcomes
            .iter()
            .position(|outcome| outcome.region == region && outcome.plot == plot);
        let index = match position {
            Some(index) => index,
            None => {
                self.outcomes.push(PlotOutcome::empty(region, plot));
                self.outcomes.len() - 1
            }
        };
        &mut self.outcomes[index]
    }

    pub fn runoff_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.runoff).count()
    }

    pub fn total_growth(&self) -> f64 {
        self.outcomes.iter().map(|outcome| outcome.growth).sum()
    }
}
