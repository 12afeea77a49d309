use tracing::{info, warn};

use crate::{
    catalog::Suitability,
    engine::{System, WeekContext},
    report::ResolutionReport,
    world::Farm,
};

/// Ages crops, fails overdue unsuitable ones and accrues weekly growth.
/// Reads the soil fraction the water balance left behind.
pub struct GrowthSystem;

impl GrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for GrowthSystem {
    fn name(&self) -> &str {
        "growth"
    }

    fn run(&mut self, ctx: &WeekContext<'_>, farm: &mut Farm, report: &mut ResolutionReport) {
        let balance = ctx.balance;
        let mut refunds = 0;
        for kind in farm.unlocked_regions() {
            let env = farm.environment(kind);
            let Some(region) = farm.region_mut(kind) else {
                continue;
            };
            for index in region.unlocked_indices() {
                let Some(plot) = region.plot_mut(index) else {
                    continue;
                };
                let soil_fraction = plot.soil_fraction;
                let Some(crop) = plot.crop.as_mut() else {
                    continue;
                };
                let Some(definition) = ctx.catalog.get(&crop.crop_id) else {
                    warn!(crop = %crop.crop_id, region = %kind, plot = index, "crop missing from catalog, skipping growth");
                    continue;
                };

                crop.age_weeks += 1;

                if crop.suitability == Suitability::Poor && crop.age_weeks > definition.max_age_weeks {
                    let refund = balance.failure_refund(definition.planting_cost);
                    refunds += refund;
                    info!(crop = %definition.id, region = %kind, plot = index, refund, "crop failed in unsuitable region");
                    plot.clear_crop();
                    let outcome = report.outcome_mut(kind, index);
                    outcome.failed_crop = Some(definition.id.clone());
                    outcome.refund = refund;
                    continue;
                }

                let adequacy = (1.0 - (soil_fraction - definition.optimal_soil_water).abs() * 2.0)
                    .clamp(0.0, 1.0);
                let stages = definition
                    .stage_multipliers_override
                    .unwrap_or(balance.stage_multipliers);
                let mut growth = definition.base_weekly_growth
                    * stages.multiplier(env.phase)
                    * (0.7 + 0.3 * adequacy)
                    * balance.suitability_multiplier(crop.suitability);
                if crop.split_nitrogen_timed() {
                    let bonus = definition
                        .split_bonus_override
                        .unwrap_or(balance.split_nitrogen_bonus);
                    growth *= 1.0 + bonus;
                }

                let was_ready = crop.ready_for_harvest;
                crop.add_growth(growth);

                let outcome = report.outcome_mut(kind, index);
                outcome.growth = growth;
                outcome.matured = !was_ready && crop.ready_for_harvest;
            }
        }
        farm.credit(refunds);
        report.gold_delta += refunds;
    }
}
