use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{RegionKind, Suitability};
use crate::environment::VegetationPhase;
use crate::plot::SoilTexture;

fn default_starting_gold() -> i64 {
    60
}

fn default_irrigation_cost() -> u32 {
    5
}

fn default_irrigation_base_mm() -> f64 {
    10.0
}

fn default_nitrogen_cost() -> u32 {
    8
}

fn default_base_plot_cost() -> u32 {
    60
}

fn default_plot_cost_multiplier() -> f64 {
    1.25
}

fn default_runoff_penalty() -> u32 {
    3
}

fn default_leaching_penalty() -> u32 {
    5
}

fn default_second_irrigation_efficiency() -> f64 {
    0.7
}

fn default_third_plus_irrigation_efficiency() -> f64 {
    0.4
}

fn default_runoff_threshold() -> f64 {
    0.85
}

fn default_split_nitrogen_bonus() -> f64 {
    0.1
}

fn default_marginal_multiplier() -> f64 {
    0.8
}

fn default_poor_multiplier() -> f64 {
    0.6
}

fn default_crop_failure_refund() -> f64 {
    0.5
}

fn default_initial_soil_fraction() -> f64 {
    0.6
}

fn default_starting_plots() -> usize {
    2
}

fn default_max_plots_per_region() -> usize {
    9
}

/// Water held at field capacity, as a fraction, per soil texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCapacityTable {
    pub sandy: f64,
    pub loam: f64,
    pub clay: f64,
}

impl FieldCapacityTable {
    pub fn fraction(&self, texture: SoilTexture) -> f64 {
        match texture {
            SoilTexture::Sandy => self.sandy,
            SoilTexture::Loam => self.loam,
            SoilTexture::Clay => self.clay,
        }
    }

    pub fn capacity_mm(&self, texture: SoilTexture) -> f64 {
        self.fraction(texture) * 100.0
    }
}

impl Default for FieldCapacityTable {
    fn default() -> Self {
        Self {
            sandy: 0.5,
            loam: 0.6,
            clay: 0.7,
        }
    }
}

/// Growth multiplier per vegetation phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageMultipliers {
    pub dormant: f64,
    pub green_up: f64,
    pub peak: f64,
    pub senescence: f64,
}

impl StageMultipliers {
    pub fn multiplier(&self, phase: VegetationPhase) -> f64 {
        match phase {
            VegetationPhase::Dormant => self.dormant,
            VegetationPhase::GreenUp => self.green_up,
            VegetationPhase::Peak => self.peak,
            VegetationPhase::Senescence => self.senescence,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.dormant, self.green_up, self.peak, self.senescence]
    }
}

impl Default for StageMultipliers {
    fn default() -> Self {
        Self {
            dormant: 0.6,
            green_up: 1.0,
            peak: 1.1,
            senescence: 0.7,
        }
    }
}

/// Flat unlock price per region tier. The starting tier is free.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionUnlockCosts {
    #[serde(default)]
    pub tropical_monsoon: u32,
    #[serde(default = "default_steppe_unlock")]
    pub semi_arid_steppe: u32,
    #[serde(default = "default_temperate_unlock")]
    pub temperate_continental: u32,
}

fn default_steppe_unlock() -> u32 {
    250
}

fn default_temperate_unlock() -> u32 {
    500
}

impl Default for RegionUnlockCosts {
    fn default() -> Self {
        Self {
            tropical_monsoon: 0,
            semi_arid_steppe: default_steppe_unlock(),
            temperate_continental: default_temperate_unlock(),
        }
    }
}

/// Every tunable constant of a session. Missing YAML fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceParameters {
    #[serde(default = "default_starting_gold")]
    pub starting_gold: i64,
    #[serde(default = "default_irrigation_cost")]
    pub irrigation_cost: u32,
    #[serde(default = "default_irrigation_base_mm")]
    pub irrigation_base_mm: f64,
    #[serde(default = "default_nitrogen_cost")]
    pub nitrogen_part_a_cost: u32,
    #[serde(default = "default_nitrogen_cost")]
    pub nitrogen_part_b_cost: u32,
    #[serde(default = "default_base_plot_cost")]
    pub base_plot_cost: u32,
    #[serde(default = "default_plot_cost_multiplier")]
    pub plot_cost_multiplier: f64,
    #[serde(default = "default_runoff_penalty")]
    pub runoff_penalty: u32,
    #[serde(default = "default_leaching_penalty")]
    pub leaching_penalty: u32,
    #[serde(default = "default_second_irrigation_efficiency")]
    pub second_irrigation_efficiency: f64,
    #[serde(default = "default_third_plus_irrigation_efficiency")]
    pub third_plus_irrigation_efficiency: f64,
    #[serde(default)]
    pub field_capacity: FieldCapacityTable,
    #[serde(default = "default_runoff_threshold")]
    pub runoff_threshold: f64,
    #[serde(default)]
    pub stage_multipliers: StageMultipliers,
    #[serde(default = "default_split_nitrogen_bonus")]
    pub split_nitrogen_bonus: f64,
    #[serde(default = "default_marginal_multiplier")]
    pub marginal_suitability_multiplier: f64,
    #[serde(default = "default_poor_multiplier")]
    pub poor_suitability_multiplier: f64,
    #[serde(default = "default_crop_failure_refund")]
    pub crop_failure_refund: f64,
    #[serde(default = "default_initial_soil_fraction")]
    pub initial_soil_fraction: f64,
    #[serde(default = "default_starting_plots")]
    pub starting_plots: usize,
    #[serde(default = "default_max_plots_per_region")]
    pub max_plots_per_region: usize,
    #[serde(default)]
    pub region_unlock_costs: RegionUnlockCosts,
}

impl Default for BalanceParameters {
    fn default() -> Self {
        Self {
            starting_gold: default_starting_gold(),
            irrigation_cost: default_irrigation_cost(),
            irrigation_base_mm: default_irrigation_base_mm(),
            nitrogen_part_a_cost: default_nitrogen_cost(),
            nitrogen_part_b_cost: default_nitrogen_cost(),
            base_plot_cost: default_base_plot_cost(),
            plot_cost_multiplier: default_plot_cost_multiplier(),
            runoff_penalty: default_runoff_penalty(),
            leaching_penalty: default_leaching_penalty(),
            second_irrigation_efficiency: default_second_irrigation_efficiency(),
            third_plus_irrigation_efficiency: default_third_plus_irrigation_efficiency(),
            field_capacity: FieldCapacityTable::default(),
            runoff_threshold: default_runoff_threshold(),
            stage_multipliers: StageMultipliers::default(),
            split_nitrogen_bonus: default_split_nitrogen_bonus(),
            marginal_suitability_multiplier: default_marginal_multiplier(),
            poor_suitability_multiplier: default_poor_multiplier(),
            crop_failure_refund: default_crop_failure_refund(),
            initial_soil_fraction: default_initial_soil_fraction(),
            starting_plots: default_starting_plots(),
            max_plots_per_region: default_max_plots_per_region(),
            region_unlock_costs: RegionUnlockCosts::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("balance field `{field}` is {value}, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("balance parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

fn check(
    field: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), BalanceError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(BalanceError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), BalanceError> {
    check(field, value, (0.0..=1.0).contains(&value), "a value in [0, 1]")
}

impl BalanceParameters {
    pub fn from_yaml_str(text: &str) -> Result<Self, BalanceError> {
        let balance: BalanceParameters = serde_yaml::from_str(text)?;
        balance.validate()?;
        Ok(balance)
    }

    pub fn validate(&self) -> Result<(), BalanceError> {
        let second = self.second_irrigation_efficiency;
        check(
            "second_irrigation_efficiency",
            second,
            second > 0.0 && second <= 1.0,
            "a value in (0, 1]",
        )?;
        let third = self.third_plus_irrigation_efficiency;
        check(
            "third_plus_irrigation_efficiency",
            third,
            third > 0.0 && third <= 1.0,
            "a value in (0, 1]",
        )?;
        check(
            "irrigation_base_mm",
            self.irrigation_base_mm,
            self.irrigation_base_mm >= 0.0,
            "a non-negative amount",
        )?;
        check(
            "plot_cost_multiplier",
            self.plot_cost_multiplier,
            self.plot_cost_multiplier >= 1.0,
            "a multiplier of at least 1",
        )?;
        for (field, value) in [
            ("field_capacity.sandy", self.field_capacity.sandy),
            ("field_capacity.loam", self.field_capacity.loam),
            ("field_capacity.clay", self.field_capacity.clay),
        ] {
            check(field, value, value > 0.0 && value <= 1.0, "a value in (0, 1]")?;
        }
        for value in self.stage_multipliers.values() {
            check(
                "stage_multipliers",
                value,
                value >= 0.0,
                "non-negative multipliers",
            )?;
        }
        unit_interval("runoff_threshold", self.runoff_threshold)?;
        unit_interval("split_nitrogen_bonus", self.split_nitrogen_bonus)?;
        unit_interval(
            "marginal_suitability_multiplier",
            self.marginal_suitability_multiplier,
        )?;
        unit_interval("poor_suitability_multiplier", self.poor_suitability_multiplier)?;
        unit_interval("crop_failure_refund", self.crop_failure_refund)?;
        unit_interval("initial_soil_fraction", self.initial_soil_fraction)?;
        let plots = self.starting_plots as f64;
        check(
            "starting_plots",
            plots,
            self.starting_plots >= 1 && self.starting_plots <= self.max_plots_per_region,
            "at least 1 and no more than max_plots_per_region",
        )?;
        Ok(())
    }

    /// Water delivered per irrigation event, by how many events the plot already had this week.
    pub fn irrigation_efficiency(&self, events_this_week: u32) -> f64 {
        match events_this_week {
            0 => 1.0,
            1 => self.second_irrigation_efficiency,
            _ => self.third_plus_irrigation_efficiency,
        }
    }

    pub fn suitability_multiplier(&self, suitability: Suitability) -> f64 {
        match suitability {
            Suitability::Good => 1.0,
            Suitability::Marginal => self.marginal_suitability_multiplier,
            Suitability::Poor => self.poor_suitability_multiplier,
        }
    }

    /// Geometric price anchored at the free starting plots.
    pub fn plot_cost(&self, unlocked_count: usize) -> i64 {
        let exponent = unlocked_count as i32 - self.starting_plots as i32;
        let cost = f64::from(self.base_plot_cost) * self.plot_cost_multiplier.powi(exponent);
        cost.round() as i64
    }

    pub fn region_unlock_cost(&self, region: RegionKind) -> i64 {
        let costs = &self.region_unlock_costs;
        i64::from(match region {
            RegionKind::TropicalMonsoon => costs.tropical_monsoon,
            RegionKind::SemiAridSteppe => costs.semi_arid_steppe,
            RegionKind::TemperateContinental => costs.temperate_continental,
        })
    }

    pub fn failure_refund(&self, planting_cost: u32) -> i64 {
        (f64::from(planting_cost) * self.crop_failure_refund).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(BalanceParameters::default().validate().is_ok());
    }

    #[test]
    fn efficiency_tiers() {
        let balance = BalanceParameters::default();
        assert_eq!(balance.irrigation_efficiency(0), 1.0);
        assert_eq!(balance.irrigation_efficiency(1), 0.7);
        assert_eq!(balance.irrigation_efficiency(2), 0.4);
        assert_eq!(balance.irrigation_efficiency(7), 0.4);
    }

    #[test]
    fn plot_cost_grows_geometrically_from_starting_plots() {
        let balance = BalanceParameters::default();
        assert_eq!(balance.plot_cost(2), 60);
        assert_eq!(balance.plot_cost(3), 75);
        assert_eq!(balance.plot_cost(4), 94);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let balance =
            BalanceParameters::from_yaml_str("starting_gold: 200\nfield_capacity:\n  sandy: 0.4\n  loam: 0.5\n  clay: 0.8\n")
                .unwrap();
        assert_eq!(balance.starting_gold, 200);
        assert_eq!(balance.field_capacity.capacity_mm(SoilTexture::Clay), 80.0);
        assert_eq!(balance.irrigation_cost, 5);
        assert_eq!(balance.region_unlock_costs.semi_arid_steppe, 250);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = BalanceParameters::from_yaml_str("runoff_threshold: 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            BalanceError::OutOfRange {
                field: "runoff_threshold",
                ..
            }
        ));
        let err = BalanceParameters::from_yaml_str("plot_cost_multiplier: 0.9\n").unwrap_err();
        assert!(err.to_string().contains("plot_cost_multiplier"));
    }

    #[test]
    fn refund_rounds_half_of_planting_cost() {
        let balance = BalanceParameters::default();
        assert_eq!(balance.failure_refund(15), 8);
        assert_eq!(balance.failure_refund(12), 6);
    }
}
