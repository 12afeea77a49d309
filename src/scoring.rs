//! Yield to currency conversion.

use serde::{Deserialize, Serialize};

use crate::catalog::RegionKind;
use crate::plot::PlotRecord;
use crate::world::Farm;

/// Gold a plot is worth if harvested now: one gold per whole growth point.
pub fn harvest_value(plot: &PlotRecord) -> i64 {
    match &plot.crop {
        Some(crop) if crop.accumulated_growth > 0.0 => crop.accumulated_growth.round() as i64,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotYield {
    pub region: RegionKind,
    pub plot: usize,
    pub gold: i64,
}

/// Result of the single end-of-season harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestScore {
    pub harvest_gold: i64,
    pub remaining_gold: i64,
    pub final_score: i64,
    pub yields: Vec<PlotYield>,
}

/// Scores every planted plot with positive growth. Does not mutate the farm.
pub fn season_harvest(farm: &Farm) -> HarvestScore {
    let yields: Vec<PlotYield> = farm
        .regions()
        .flat_map(|region| {
            region.plots().filter_map(move |plot| {
                let gold = harvest_value(plot);
                (gold > 0).then_some(PlotYield {
                    region: region.kind,
                    plot: plot.id,
                    gold,
                })
            })
        })
        .collect();
    let harvest_gold = yields.iter().map(|entry| entry.gold).sum();
    HarvestScore {
        harvest_gold,
        remaining_gold: farm.gold(),
        final_score: harvest_gold + farm.gold(),
        yields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Suitability;
    use crate::plot::{CropState, SoilTexture};

    #[test]
    fn value_rounds_growth() {
        let mut plot = PlotRecord::new(0, SoilTexture::Loam, 0.6);
        assert_eq!(harvest_value(&plot), 0);
        let mut crop = CropState::new("rice", 0, 100.0, Suitability::Good);
        crop.add_growth(41.5);
        plot.crop = Some(crop);
        assert_eq!(harvest_value(&plot), 42);
    }
}
