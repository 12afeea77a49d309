//! Player commands. Each returns whether it was accepted; a rejected command
//! leaves the farm untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::TurnEngine;
use crate::{
    catalog::RegionKind,
    observer::Cue,
    plot::{CropState, NitrogenDose, NitrogenPart},
    scoring,
    world::{GameMode, Phase},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SelectPlot { index: usize },
    SelectRegion { region: RegionKind },
    QueueIrrigation { plot: usize },
    PlantCrop { crop: String },
    ApplyNitrogenPartA,
    ApplyNitrogenPartB,
    BuyNewPlot,
    UnlockPlot { index: usize },
    UnlockRegion { region: RegionKind },
    EndPlanningAndResolve,
    NextWeek,
    HarvestSelectedPlot,
    Restart,
}

fn reject(command: &'static str, reason: &str) -> bool {
    debug!(command, reason, "command rejected");
    false
}

impl TurnEngine {
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::SelectPlot { index } => self.select_plot(index),
            Command::SelectRegion { region } => self.select_region(region),
            Command::QueueIrrigation { plot } => self.queue_irrigation(plot),
            Command::PlantCrop { crop } => self.plant_crop(&crop),
            Command::ApplyNitrogenPartA => self.apply_nitrogen(NitrogenPart::A),
            Command::ApplyNitrogenPartB => self.apply_nitrogen(NitrogenPart::B),
            Command::BuyNewPlot => self.buy_new_plot(),
            Command::UnlockPlot { index } => self.unlock_plot(index),
            Command::UnlockRegion { region } => self.unlock_region(region),
            Command::EndPlanningAndResolve => self.end_planning_and_resolve(),
            Command::NextWeek => self.next_week(),
            Command::HarvestSelectedPlot => self.harvest_selected_plot(),
            Command::Restart => self.restart(),
        }
    }

    fn in_planning(&self, command: &'static str) -> bool {
        self.farm.phase == Phase::Planning || reject(command, "not in planning")
    }

    /// Valid in any phase.
    pub fn select_plot(&mut self, index: usize) -> bool {
        let unlocked = self
            .farm
            .active_economy()
            .is_some_and(|region| region.is_unlocked(index));
        if !unlocked {
            return reject("select_plot", "plot is not unlocked");
        }
        self.farm.selected_plot = index;
        true
    }

    /// Valid in any phase. Selection moves to the region's first plot.
    pub fn select_region(&mut self, region: RegionKind) -> bool {
        let Some(first) = self
            .farm
            .region(region)
            .and_then(|economy| economy.unlocked_indices().first().copied())
        else {
            return reject("select_region", "region is not unlocked");
        };
        self.farm.active_region = region;
        self.farm.selected_plot = first;
        true
    }

    /// Queues water on a plot of the active region. Soil is untouched until the resolve.
    pub fn queue_irrigation(&mut self, index: usize) -> bool {
        if !self.in_planning("queue_irrigation") {
            return false;
        }
        let cost = i64::from(self.balance.irrigation_cost);
        if self.farm.gold < cost {
            return reject("queue_irrigation", "not enough gold");
        }
        let kind = self.farm.active_region;
        let base_mm = self.balance.irrigation_base_mm;
        let Some(region) = self.farm.region_mut(kind) else {
            return reject("queue_irrigation", "no active region");
        };
        let Some(plot) = region.plot_mut(index) else {
            return reject("queue_irrigation", "plot is not unlocked");
        };
        let mm = base_mm * self.balance.irrigation_efficiency(plot.irrigation_events_this_week);
        plot.irrigation_events_this_week += 1;
        plot.irrigation_mm_this_week += mm;
        region.add_pending_irrigation(index, mm);
        self.farm.charge(cost);
        self.emit(Cue::Irrigated {
            region: kind,
            plot: index,
            mm,
        });
        true
    }

    pub fn plant_crop(&mut self, crop_id: &str) -> bool {
        if !self.in_planning("plant_crop") {
            return false;
        }
        let Some(definition) = self.catalog.get(crop_id) else {
            return reject("plant_crop", "unknown crop");
        };
        let cost = i64::from(definition.planting_cost);
        let suitability = definition.suitability.for_region(self.farm.active_region);
        let crop = CropState::new(
            definition.id.clone(),
            self.farm.week_index,
            definition.maturity_target,
            suitability,
        );
        match self.farm.selected() {
            Some(plot) if plot.is_empty() => {}
            Some(_) => return reject("plant_crop", "plot already planted"),
            None => return reject("plant_crop", "no plot selected"),
        }
        if !self.farm.try_spend(cost) {
            return reject("plant_crop", "not enough gold");
        }
        let (region, plot) = (self.farm.active_region, self.farm.selected_plot);
        let crop_name = crop.crop_id.clone();
        if let Some(selected) = self.farm.selected_mut() {
            selected.crop = Some(crop);
        }
        self.emit(Cue::Planted {
            region,
            plot,
            crop: crop_name,
        });
        true
    }

    /// Applies one nitrogen part to the selected crop. Wet soil schedules a
    /// leaching penalty for the next week boundary instead of blocking.
    pub fn apply_nitrogen(&mut self, part: NitrogenPart) -> bool {
        if !self.in_planning("apply_nitrogen") {
            return false;
        }
        let cost = i64::from(match part {
            NitrogenPart::A => self.balance.nitrogen_part_a_cost,
            NitrogenPart::B => self.balance.nitrogen_part_b_cost,
        });
        match self.farm.selected().and_then(|plot| plot.crop.as_ref()) {
            Some(crop) if crop.nitrogen(part).is_none() => {}
            Some(_) => return reject("apply_nitrogen", "part already applied"),
            None => return reject("apply_nitrogen", "no crop planted"),
        }
        if !self.farm.try_spend(cost) {
            return reject("apply_nitrogen", "not enough gold");
        }

        let dose = NitrogenDose {
            week: self.farm.week_index,
            phase: self.farm.environment(self.farm.active_region).phase,
        };
        let threshold = self.balance.runoff_threshold;
        let penalty = self.balance.leaching_penalty;
        let (region, index) = (self.farm.active_region, self.farm.selected_plot);
        if let Some(plot) = self.farm.selected_mut() {
            if plot.soil_fraction >= threshold {
                plot.pending_leach_penalty += penalty;
                info!(region = %region, plot = index, penalty, "leaching scheduled");
            }
            if let Some(crop) = plot.crop.as_mut() {
                *crop.nitrogen_slot(part) = Some(dose);
            }
        }
        self.emit(Cue::Fertilized {
            region,
            plot: index,
            part,
        });
        true
    }

    /// Unlocks the lowest locked plot of the active region.
    pub fn buy_new_plot(&mut self) -> bool {
        let next = self
            .farm
            .active_economy()
            .and_then(|region| region.next_locked_index(self.balance.max_plots_per_region));
        match next {
            Some(index) => self.unlock_plot_as("buy_new_plot", index),
            None => reject("buy_new_plot", "region is full"),
        }
    }

    pub fn unlock_plot(&mut self, index: usize) -> bool {
        self.unlock_plot_as("unlock_plot", index)
    }

    fn unlock_plot_as(&mut self, command: &'static str, index: usize) -> bool {
        if !self.in_planning(command) {
            return false;
        }
        if index >= self.balance.max_plots_per_region {
            return reject(command, "index beyond the plot cap");
        }
        let kind = self.farm.active_region;
        let Some(region) = self.farm.region(kind) else {
            return reject(command, "no active region");
        };
        if region.is_unlocked(index) {
            return reject(command, "plot already unlocked");
        }
        let cost = self.balance.plot_cost(region.unlocked_count());
        if !self.farm.try_spend(cost) {
            return reject(command, "not enough gold");
        }
        let texture = kind.profile().dominant_soil;
        let fraction = self.balance.initial_soil_fraction;
        if let Some(region) = self.farm.region_mut(kind) {
            region.unlock(index, texture, fraction);
        }
        info!(region = %kind, plot = index, cost, "plot unlocked");
        true
    }

    pub fn unlock_region(&mut self, region: RegionKind) -> bool {
        if !self.mode.is_endless() {
            return reject("unlock_region", "only endless sessions span regions");
        }
        if !self.in_planning("unlock_region") {
            return false;
        }
        if self.farm.is_region_unlocked(region) {
            return reject("unlock_region", "region already unlocked");
        }
        let cost = self.balance.region_unlock_cost(region);
        if !self.farm.try_spend(cost) {
            return reject("unlock_region", "not enough gold");
        }
        self.farm.open_region(region, &self.balance);
        let env = self
            .provider
            .weekly_environment(region, self.farm.week_index);
        self.farm.environments.insert(region, env);
        info!(%region, cost, "region unlocked");
        true
    }

    /// Planning -> Resolving -> End, resolving every unlocked plot.
    pub fn end_planning_and_resolve(&mut self) -> bool {
        if !self.in_planning("end_planning_and_resolve") {
            return false;
        }
        self.set_phase(Phase::Resolving);
        let report = self.resolve_week();

        let mut cues = Vec::new();
        for outcome in &report.outcomes {
            if outcome.runoff {
                cues.push(Cue::Runoff {
                    region: outcome.region,
                    plot: outcome.plot,
                });
            }
            if let Some(crop) = &outcome.failed_crop {
                cues.push(Cue::CropFailed {
                    region: outcome.region,
                    plot: outcome.plot,
                    crop: crop.clone(),
                });
            }
        }
        debug!(
            week = report.week,
            gold_delta = report.gold_delta,
            runoff = report.runoff_count(),
            "week resolved"
        );
        self.last_report = Some(report);
        for cue in cues {
            self.emit(cue);
        }
        self.set_phase(Phase::End);
        true
    }

    /// End -> Planning on the next week, or Harvest when a fixed season runs out.
    pub fn next_week(&mut self) -> bool {
        if self.farm.phase != Phase::End {
            return reject("next_week", "week not resolved");
        }
        self.advance_week();
        true
    }

    /// Sells a mature crop in endless mode and clears the plot for replanting.
    /// A scheduled leaching penalty stays on the plot.
    pub fn harvest_selected_plot(&mut self) -> bool {
        if !self.mode.is_endless() {
            return reject("harvest_selected_plot", "fixed seasons harvest at the end");
        }
        if !self.in_planning("harvest_selected_plot") {
            return false;
        }
        let (region, index) = (self.farm.active_region, self.farm.selected_plot);
        let Some(plot) = self.farm.selected_mut() else {
            return reject("harvest_selected_plot", "no plot selected");
        };
        if !plot.is_ready_for_harvest() {
            return reject("harvest_selected_plot", "crop not ready");
        }
        let gold = scoring::harvest_value(plot);
        plot.clear_crop();
        self.farm.credit(gold);
        info!(region = %region, plot = index, gold, "plot harvested");
        self.emit(Cue::Harvested {
            region,
            plot: index,
            gold,
        });
        true
    }

    /// Starts a fixed season over from its initial state.
    pub fn restart(&mut self) -> bool {
        if let GameMode::FixedSeason { .. } = self.mode {
            self.reset();
            true
        } else {
            reject("restart", "endless sessions cannot restart")
        }
    }
}
