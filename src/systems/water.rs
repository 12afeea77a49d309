use tracing::info;

use crate::{
    engine::{System, WeekContext},
    report::ResolutionReport,
    world::Farm,
};

/// Moves rain, irrigation and evapotranspiration through each plot's soil tank.
/// Runoff is charged here, during the resolve that causes it.
pub struct WaterBalanceSystem;

impl WaterBalanceSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WaterBalanceSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WaterBalanceSystem {
    fn name(&self) -> &str {
        "water_balance"
    }

    fn run(&mut self, ctx: &WeekContext<'_>, farm: &mut Farm, report: &mut ResolutionReport) {
        let balance = ctx.balance;
        let mut penalties = 0;
        for kind in farm.unlocked_regions() {
            let env = farm.environment(kind);
            let Some(region) = farm.region_mut(kind) else {
                continue;
            };
            for index in region.unlocked_indices() {
                let irrigation = region.pending_irrigation(index);
                let Some(plot) = region.plot_mut(index) else {
                    continue;
                };
                let capacity_mm = balance.field_capacity.capacity_mm(plot.soil_texture);
                let water_in = env.rain_mm + irrigation;
                let water_out = env.et_mm;

                let before = plot.soil_fraction;
                let soil_mm = before * capacity_mm;
                let new_soil_mm = (soil_mm + water_in - water_out).clamp(0.0, capacity_mm);

                let runoff = before >= balance.runoff_threshold && water_in - water_out > 0.0;
                if runoff {
                    plot.runoff_event_count += 1;
                    penalties += i64::from(balance.runoff_penalty);
                    info!(region = %kind, plot = index, week = ctx.week, "runoff penalty");
                }

                let after = if capacity_mm > 0.0 {
                    new_soil_mm / capacity_mm
                } else {
                    0.0
                };
                plot.set_soil_fraction(after);

                let outcome = report.outcome_mut(kind, index);
                outcome.water_in_mm = water_in;
                outcome.water_out_mm = water_out;
                outcome.soil_fraction_before = before;
                outcome.soil_fraction_after = plot.soil_fraction;
                outcome.runoff = runoff;
            }
        }
        farm.charge(penalties);
        report.gold_delta -= penalties;
    }
}
