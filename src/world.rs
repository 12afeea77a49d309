use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::balance::BalanceParameters;
use crate::catalog::RegionKind;
use crate::economy::RegionEconomy;
use crate::environment::WeeklyEnvironment;
use crate::plot::PlotRecord;
use crate::scoring::HarvestScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    /// One region, one gold pool, scored once after `total_weeks`.
    FixedSeason { total_weeks: u32 },
    /// Several regions on one global week, harvested plot by plot.
    Endless,
}

impl GameMode {
    pub fn is_endless(&self) -> bool {
        matches!(self, GameMode::Endless)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Planning,
    Resolving,
    End,
    Harvest,
}

/// All mutable state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub(crate) week_index: u32,
    pub(crate) gold: i64,
    pub(crate) phase: Phase,
    pub(crate) active_region: RegionKind,
    pub(crate) selected_plot: usize,
    pub(crate) regions: BTreeMap<RegionKind, RegionEconomy>,
    #[serde(default)]
    pub(crate) environments: BTreeMap<RegionKind, WeeklyEnvironment>,
    #[serde(default)]
    pub(crate) harvest: Option<HarvestScore>,
}

impl Farm {
    /// A fresh farm with the starting plots of one region unlocked.
    pub fn new(starting_region: RegionKind, balance: &BalanceParameters) -> Self {
        let mut farm = Self {
            week_index: 0,
            gold: balance.starting_gold,
            phase: Phase::Planning,
            active_region: starting_region,
            selected_plot: 0,
            regions: BTreeMap::new(),
            environments: BTreeMap::new(),
            harvest: None,
        };
        farm.open_region(starting_region, balance);
        farm
    }

    pub(crate) fn open_region(&mut self, kind: RegionKind, balance: &BalanceParameters) {
        let texture = kind.profile().dominant_soil;
        let region = self
            .regions
            .entry(kind)
            .or_insert_with(|| RegionEconomy::new(kind));
        for index in 0..balance.starting_plots {
            region.unlock(index, texture, balance.initial_soil_fraction);
        }
    }

    pub fn week_index(&self) -> u32 {
        self.week_index
    }

    pub fn gold(&self) -> i64 {
        self.gold
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_region(&self) -> RegionKind {
        self.active_region
    }

    pub fn selected_plot(&self) -> usize {
        self.selected_plot
    }

    pub fn harvest(&self) -> Option<&HarvestScore> {
        self.harvest.as_ref()
    }

    pub fn region(&self, kind: RegionKind) -> Option<&RegionEconomy> {
        self.regions.get(&kind)
    }

    pub(crate) fn region_mut(&mut self, kind: RegionKind) -> Option<&mut RegionEconomy> {
        self.regions.get_mut(&kind)
    }

    pub fn is_region_unlocked(&self, kind: RegionKind) -> bool {
        self.regions.contains_key(&kind)
    }

    /// Unlocked regions in a stable order.
    pub fn unlocked_regions(&self) -> Vec<RegionKind> {
        self.regions.keys().copied().collect()
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionEconomy> {
        self.regions.values()
    }

    pub fn active_economy(&self) -> Option<&RegionEconomy> {
        self.region(self.active_region)
    }

    pub fn selected(&self) -> Option<&PlotRecord> {
        self.active_economy()
            .and_then(|region| region.plot(self.selected_plot))
    }

    pub(crate) fn selected_mut(&mut self) -> Option<&mut PlotRecord> {
        let index = self.selected_plot;
        let kind = self.active_region;
        self.region_mut(kind).and_then(|region| region.plot_mut(index))
    }

    pub fn environment(&self, kind: RegionKind) -> WeeklyEnvironment {
        self.environments.get(&kind).copied().unwrap_or_default()
    }

    /// Debits gold if the pool covers `amount`.
    pub(crate) fn try_spend(&mut self, amount: i64) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }

    /// Unconditional debit; penalties may push gold below zero.
    pub(crate) fn charge(&mut self, amount: i64) {
        self.gold -= amount;
    }

    pub(crate) fn credit(&mut self, amount: i64) {
        self.gold += amount;
    }
}
