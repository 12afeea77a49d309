//! Read-only views of the engine handed to presentation layers.

use serde::Serialize;

use crate::calendar::WeekLabel;
use crate::catalog::{RegionKind, Suitability};
use crate::environment::WeeklyEnvironment;
use crate::plot::SoilTexture;
use crate::scoring::HarvestScore;
use crate::world::{GameMode, Phase};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotView {
    pub index: usize,
    pub soil_texture: SoilTexture,
    pub soil_fraction: f64,
    /// Soil fraction including water queued this week.
    pub preview_soil_fraction: f64,
    pub crop: Option<String>,
    pub planted_week: Option<u32>,
    pub crop_age_weeks: u32,
    pub accumulated_growth: f64,
    pub maturity_target: f64,
    pub ready_for_harvest: bool,
    pub suitability: Option<Suitability>,
    pub nitrogen_parts_applied: u8,
    pub nitrogen_part_a_week: Option<u32>,
    pub nitrogen_part_b_week: Option<u32>,
    pub pending_leach_penalty: u32,
    pub irrigation_events_this_week: u32,
    pub irrigation_mm_this_week: f64,
    pub pending_irrigation_mm: f64,
    pub runoff_event_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionView {
    pub kind: RegionKind,
    pub name: &'static str,
    pub unlocked: bool,
    pub unlocked_plots: usize,
    /// Price to open this region, when it can still be bought.
    pub unlock_cost: Option<i64>,
    pub environment: Option<WeeklyEnvironment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub mode: GameMode,
    pub phase: Phase,
    pub week_index: u32,
    pub calendar: WeekLabel,
    pub gold: i64,
    pub active_region: RegionKind,
    pub selected_plot: usize,
    pub environment: WeeklyEnvironment,
    pub plots: Vec<PlotView>,
    pub regions: Vec<RegionView>,
    pub next_plot_cost: Option<i64>,
    pub harvest: Option<HarvestScore>,
}

impl EngineSnapshot {
    pub fn plot(&self, index: usize) -> Option<&PlotView> {
        self.plots.iter().find(|plot| plot.index == index)
    }
}
