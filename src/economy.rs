use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::RegionKind;
use crate::plot::{PlotRecord, SoilTexture};

/// Plots of one region. Slots are addressed by stable index and may hold
/// placeholders before they are unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEconomy {
    pub kind: RegionKind,
    plots: Vec<Option<PlotRecord>>,
    unlocked: BTreeSet<usize>,
    #[serde(default)]
    pending_irrigation_mm: BTreeMap<usize, f64>,
}

impl RegionEconomy {
    pub fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            plots: Vec::new(),
            unlocked: BTreeSet::new(),
            pending_irrigation_mm: BTreeMap::new(),
        }
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        self.unlocked.contains(&index)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    pub fn unlocked_indices(&self) -> Vec<usize> {
        self.unlocked.iter().copied().collect()
    }

    pub fn slot_count(&self) -> usize {
        self.plots.len()
    }

    pub fn plot(&self, index: usize) -> Option<&PlotRecord> {
        if !self.is_unlocked(index) {
            return None;
        }
        self.plots.get(index).and_then(Option::as_ref)
    }

    pub fn plot_mut(&mut self, index: usize) -> Option<&mut PlotRecord> {
        if !self.is_unlocked(index) {
            return None;
        }
        self.plots.get_mut(index).and_then(Option::as_mut)
    }

    /// Unlocked plots in index order.
    pub fn plots(&self) -> impl Iterator<Item = &PlotRecord> {
        self.unlocked
            .iter()
            .filter_map(|index| self.plots.get(*index).and_then(Option::as_ref))
    }

    /// Unlocks a slot, materializing an empty plot there if none exists yet.
    /// Returns false if the slot was already unlocked.
    pub fn unlock(&mut self, index: usize, texture: SoilTexture, soil_fraction: f64) -> bool {
        if self.is_unlocked(index) {
            return false;
        }
        if self.plots.len() <= index {
            self.plots.resize(index + 1, None);
        }
        if self.plots[index].is_none() {
            self.plots[index] = Some(PlotRecord::new(index, texture, soil_fraction));
        }
        self.unlocked.insert(index);
        true
    }

    /// Lowest locked index below `max`, if any.
    pub fn next_locked_index(&self, max: usize) -> Option<usize> {
        (0..max).find(|index| !self.is_unlocked(*index))
    }

    pub fn pending_irrigation(&self, index: usize) -> f64 {
        self.pending_irrigation_mm.get(&index).copied().unwrap_or(0.0)
    }

    pub fn add_pending_irrigation(&mut self, index: usize, mm: f64) {
        *self.pending_irrigation_mm.entry(index).or_insert(0.0) += mm;
    }

    pub fn clear_pending_irrigation(&mut self) {
        self.pending_irrigation_mm.clear();
    }

    /// Structural checks used when restoring a saved farm.
    pub fn check_layout(&self, max_plots: usize) -> Result<(), String> {
        if self.unlocked.len() > max_plots {
            return Err(format!(
                "{} has {} unlocked plots, limit is {max_plots}",
                self.kind,
                self.unlocked.len()
            ));
        }
        for index in &self.unlocked {
            if *index >= max_plots {
                return Err(format!("{} plot index {index} out of range", self.kind));
            }
            match self.plots.get(*index).and_then(Option::as_ref) {
                Some(plot) if plot.id == *index => {}
                Some(_) => return Err(format!("{} plot {index} has a mismatched id", self.kind)),
                None => return Err(format!("{} plot {index} is unlocked but missing", self.kind)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_materializes_lazily() {
        let mut region = RegionEconomy::new(RegionKind::TropicalMonsoon);
        assert!(region.unlock(4, SoilTexture::Loam, 0.6));
        assert_eq!(region.slot_count(), 5);
        assert!(region.plot(3).is_none());
        assert_eq!(region.plot(4).map(|plot| plot.id), Some(4));
        assert!(!region.unlock(4, SoilTexture::Clay, 0.1));
        assert_eq!(region.plot(4).map(|plot| plot.soil_texture), Some(SoilTexture::Loam));
    }

    #[test]
    fn next_locked_index_skips_unlocked() {
        let mut region = RegionEconomy::new(RegionKind::SemiAridSteppe);
        region.unlock(0, SoilTexture::Sandy, 0.6);
        region.unlock(1, SoilTexture::Sandy, 0.6);
        assert_eq!(region.next_locked_index(9), Some(2));
        assert_eq!(region.next_locked_index(2), None);
    }

    #[test]
    fn pending_irrigation_accumulates() {
        let mut region = RegionEconomy::new(RegionKind::TemperateContinental);
        region.add_pending_irrigation(0, 10.0);
        region.add_pending_irrigation(0, 7.0);
        assert_eq!(region.pending_irrigation(0), 17.0);
        assert_eq!(region.pending_irrigation(1), 0.0);
        region.clear_pending_irrigation();
        assert_eq!(region.pending_irrigation(0), 0.0);
    }

    #[test]
    fn layout_check_rejects_overflow() {
        let mut region = RegionEconomy::new(RegionKind::TropicalMonsoon);
        region.unlock(10, SoilTexture::Loam, 0.6);
        assert!(region.check_layout(9).is_err());
    }
}
