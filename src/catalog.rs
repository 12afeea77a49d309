use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balance::StageMultipliers;
use crate::plot::SoilTexture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    TropicalMonsoon,
    SemiAridSteppe,
    TemperateContinental,
}

impl RegionKind {
    pub const ALL: [RegionKind; 3] = [
        RegionKind::TropicalMonsoon,
        RegionKind::SemiAridSteppe,
        RegionKind::TemperateContinental,
    ];

    /// Stable index used to derive per-region random streams.
    pub fn index(self) -> u64 {
        match self {
            RegionKind::TropicalMonsoon => 0,
            RegionKind::SemiAridSteppe => 1,
            RegionKind::TemperateContinental => 2,
        }
    }

    pub fn profile(self) -> RegionProfile {
        match self {
            RegionKind::TropicalMonsoon => RegionProfile {
                display_name: "Tropical Monsoon",
                latitude_deg: 1.5,
                dominant_soil: SoilTexture::Loam,
                rain_mm: (5.0, 25.0),
                et_mm: (12.0, 20.0),
            },
            RegionKind::SemiAridSteppe => RegionProfile {
                display_name: "Semi-Arid Steppe",
                latitude_deg: -6.2,
                dominant_soil: SoilTexture::Sandy,
                rain_mm: (0.0, 15.0),
                et_mm: (15.0, 25.0),
            },
            RegionKind::TemperateContinental => RegionProfile {
                display_name: "Temperate Continental",
                latitude_deg: -35.3,
                dominant_soil: SoilTexture::Clay,
                rain_mm: (3.0, 18.0),
                et_mm: (10.0, 18.0),
            },
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}

/// Static climate description of a region, used by the seeded weather generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionProfile {
    pub display_name: &'static str,
    pub latitude_deg: f64,
    pub dominant_soil: SoilTexture,
    pub rain_mm: (f64, f64),
    pub et_mm: (f64, f64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suitability {
    #[default]
    Good,
    Marginal,
    Poor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSuitability {
    #[serde(default)]
    pub tropical_monsoon: Suitability,
    #[serde(default)]
    pub semi_arid_steppe: Suitability,
    #[serde(default)]
    pub temperate_continental: Suitability,
}

impl RegionSuitability {
    pub fn new(monsoon: Suitability, steppe: Suitability, temperate: Suitability) -> Self {
        Self {
            tropical_monsoon: monsoon,
            semi_arid_steppe: steppe,
            temperate_continental: temperate,
        }
    }

    pub fn for_region(&self, region: RegionKind) -> Suitability {
        match region {
            RegionKind::TropicalMonsoon => self.tropical_monsoon,
            RegionKind::SemiAridSteppe => self.semi_arid_steppe,
            RegionKind::TemperateContinental => self.temperate_continental,
        }
    }
}

fn default_planting_cost() -> u32 {
    15
}

fn default_base_weekly_growth() -> f64 {
    1.0
}

fn default_optimal_soil_water() -> f64 {
    0.7
}

fn default_maturity_target() -> f64 {
    100.0
}

fn default_max_age_weeks() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDefinition {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_planting_cost")]
    pub planting_cost: u32,
    #[serde(default = "default_base_weekly_growth")]
    pub base_weekly_growth: f64,
    #[serde(default = "default_optimal_soil_water")]
    pub optimal_soil_water: f64,
    /// Replaces the balance split-nitrogen bonus for this crop when set.
    #[serde(default)]
    pub split_bonus_override: Option<f64>,
    /// Replaces the balance stage table for this crop when set.
    #[serde(default)]
    pub stage_multipliers_override: Option<StageMultipliers>,
    #[serde(default = "default_maturity_target")]
    pub maturity_target: f64,
    #[serde(default = "default_max_age_weeks")]
    pub max_age_weeks: u32,
    #[serde(default)]
    pub suitability: RegionSuitability,
}

impl CropDefinition {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            planting_cost: default_planting_cost(),
            base_weekly_growth: default_base_weekly_growth(),
            optimal_soil_water: default_optimal_soil_water(),
            split_bonus_override: None,
            stage_multipliers_override: None,
            maturity_target: default_maturity_target(),
            max_age_weeks: default_max_age_weeks(),
            suitability: RegionSuitability::default(),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidCrop {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if !(self.maturity_target > 0.0) {
            return Err(invalid("maturity_target must be positive"));
        }
        if !(0.0..=1.0).contains(&self.optimal_soil_water) {
            return Err(invalid("optimal_soil_water must lie in [0, 1]"));
        }
        if !(self.base_weekly_growth >= 0.0) {
            return Err(invalid("base_weekly_growth must not be negative"));
        }
        if let Some(bonus) = self.split_bonus_override {
            if !(0.0..=1.0).contains(&bonus) {
                return Err(invalid("split_bonus_override must lie in [0, 1]"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("crop catalog must define at least one crop")]
    Empty,
    #[error("crop id '{0}' defined more than once")]
    DuplicateCrop(String),
    #[error("crop '{id}' is invalid: {reason}")]
    InvalidCrop { id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropCatalog {
    crops: Vec<CropDefinition>,
}

impl CropCatalog {
    pub fn new(crops: Vec<CropDefinition>) -> Result<Self, CatalogError> {
        let catalog = Self { crops };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.crops.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for crop in &self.crops {
            crop.validate()?;
            if !seen.insert(crop.id.as_str()) {
                return Err(CatalogError::DuplicateCrop(crop.id.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CropDefinition> {
        self.crops.iter().find(|crop| crop.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropDefinition> {
        self.crops.iter()
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

impl Default for CropCatalog {
    fn default() -> Self {
        use Suitability::{Good, Marginal, Poor};

        let rice = CropDefinition {
            planting_cost: 15,
            base_weekly_growth: 14.0,
            optimal_soil_water: 0.8,
            maturity_target: 100.0,
            max_age_weeks: 16,
            suitability: RegionSuitability::new(Good, Poor, Marginal),
            ..CropDefinition::new("rice", "Rice")
        };
        let sorghum = CropDefinition {
            planting_cost: 12,
            base_weekly_growth: 11.0,
            optimal_soil_water: 0.45,
            maturity_target: 80.0,
            max_age_weeks: 14,
            suitability: RegionSuitability::new(Marginal, Good, Marginal),
            ..CropDefinition::new("sorghum", "Sorghum")
        };
        let wheat = CropDefinition {
            planting_cost: 14,
            base_weekly_growth: 12.0,
            optimal_soil_water: 0.6,
            maturity_target: 90.0,
            max_age_weeks: 16,
            suitability: RegionSuitability::new(Poor, Marginal, Good),
            ..CropDefinition::new("wheat", "Wheat")
        };
        let maize = CropDefinition {
            planting_cost: 18,
            base_weekly_growth: 15.0,
            optimal_soil_water: 0.7,
            split_bonus_override: Some(0.15),
            maturity_target: 120.0,
            max_age_weeks: 18,
            suitability: RegionSuitability::new(Good, Marginal, Good),
            ..CropDefinition::new("maize", "Maize")
        };
        Self {
            crops: vec![rice, sorghum, wheat, maize],
        }
    }
}
