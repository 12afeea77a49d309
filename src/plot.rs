use serde::{Deserialize, Serialize};

use crate::catalog::Suitability;
use crate::environment::VegetationPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilTexture {
    Sandy,
    Loam,
    Clay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NitrogenPart {
    A,
    B,
}

/// One fertilizer application: the week it happened and the vegetation phase of that week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NitrogenDose {
    pub week: u32,
    pub phase: VegetationPhase,
}

/// Everything that exists only while a crop is in the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropState {
    pub crop_id: String,
    pub planted_week: u32,
    pub age_weeks: u32,
    pub accumulated_growth: f64,
    pub maturity_target: f64,
    pub ready_for_harvest: bool,
    pub suitability: Suitability,
    pub nitrogen_a: Option<NitrogenDose>,
    pub nitrogen_b: Option<NitrogenDose>,
}

impl CropState {
    pub fn new(
        crop_id: impl Into<String>,
        planted_week: u32,
        maturity_target: f64,
        suitability: Suitability,
    ) -> Self {
        Self {
            crop_id: crop_id.into(),
            planted_week,
            age_weeks: 0,
            accumulated_growth: 0.0,
            maturity_target,
            ready_for_harvest: false,
            suitability,
            nitrogen_a: None,
            nitrogen_b: None,
        }
    }

    pub fn nitrogen(&self, part: NitrogenPart) -> Option<NitrogenDose> {
        match part {
            NitrogenPart::A => self.nitrogen_a,
            NitrogenPart::B => self.nitrogen_b,
        }
    }

    pub fn nitrogen_slot(&mut self, part: NitrogenPart) -> &mut Option<NitrogenDose> {
        match part {
            NitrogenPart::A => &mut self.nitrogen_a,
            NitrogenPart::B => &mut self.nitrogen_b,
        }
    }

    pub fn nitrogen_parts_applied(&self) -> u8 {
        u8::from(self.nitrogen_a.is_some()) + u8::from(self.nitrogen_b.is_some())
    }

    /// Both parts landed in two different weeks, each during active growth.
    pub fn split_nitrogen_timed(&self) -> bool {
        match (self.nitrogen_a, self.nitrogen_b) {
            (Some(a), Some(b)) => a.week != b.week && a.phase.is_active() && b.phase.is_active(),
            _ => false,
        }
    }

    pub fn add_growth(&mut self, growth: f64) {
        self.accumulated_growth += growth.max(0.0);
        if self.accumulated_growth >= self.maturity_target {
            self.ready_for_harvest = true;
        }
    }
}

/// One farmable cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRecord {
    pub id: usize,
    pub soil_texture: SoilTexture,
    pub soil_fraction: f64,
    pub crop: Option<CropState>,
    pub pending_leach_penalty: u32,
    pub irrigation_events_this_week: u32,
    pub irrigation_mm_this_week: f64,
    pub runoff_event_count: u32,
}

impl PlotRecord {
    pub fn new(id: usize, soil_texture: SoilTexture, soil_fraction: f64) -> Self {
        Self {
            id,
            soil_texture,
            soil_fraction: soil_fraction.clamp(0.0, 1.0),
            crop: None,
            pending_leach_penalty: 0,
            irrigation_events_this_week: 0,
            irrigation_mm_this_week: 0.0,
            runoff_event_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.crop.is_none()
    }

    pub fn accumulated_growth(&self) -> f64 {
        self.crop.as_ref().map_or(0.0, |crop| crop.accumulated_growth)
    }

    pub fn is_ready_for_harvest(&self) -> bool {
        self.crop.as_ref().is_some_and(|crop| crop.ready_for_harvest)
    }

    pub fn set_soil_fraction(&mut self, fraction: f64) {
        self.soil_fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Removes the crop and every crop-scoped field with it.
    pub fn clear_crop(&mut self) -> Option<CropState> {
        self.crop.take()
    }

    pub fn reset_weekly_irrigation(&mut self) {
        self.irrigation_events_this_week = 0;
        self.irrigation_mm_this_week = 0.0;
    }
}
