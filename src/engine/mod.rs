mod commands;

pub use commands::Command;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::{
    balance::{BalanceError, BalanceParameters},
    calendar::{default_start_date, Calendar},
    catalog::{CatalogError, CropCatalog, RegionKind},
    environment::EnvironmentProvider,
    observer::{Cue, EngineObserver},
    plot::NitrogenPart,
    report::ResolutionReport,
    save::{SaveError, SaveState, SAVE_VERSION},
    scoring,
    snapshot::{EngineSnapshot, PlotView, RegionView},
    systems::{self, GrowthSystem, WaterBalanceSystem},
    world::{Farm, GameMode, Phase},
};

/// Read-only inputs shared by every system during one resolve.
pub struct WeekContext<'a> {
    pub week: u32,
    pub balance: &'a BalanceParameters,
    pub catalog: &'a CropCatalog,
}

/// One step of the weekly resolution. Systems run in registration order.
pub trait System: Send {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &WeekContext<'_>, farm: &mut Farm, report: &mut ResolutionReport);
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("invalid game mode: {0}")]
    InvalidMode(String),
}

pub struct EngineBuilder {
    mode: GameMode,
    provider: Box<dyn EnvironmentProvider>,
    balance: BalanceParameters,
    catalog: CropCatalog,
    start_date: NaiveDate,
    starting_region: RegionKind,
    systems: Vec<Box<dyn System>>,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl EngineBuilder {
    pub fn new(mode: GameMode, provider: impl EnvironmentProvider + 'static) -> Self {
        Self {
            mode,
            provider: Box::new(provider),
            balance: BalanceParameters::default(),
            catalog: CropCatalog::default(),
            start_date: default_start_date(),
            starting_region: RegionKind::TropicalMonsoon,
            systems: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn balance(mut self, balance: BalanceParameters) -> Self {
        self.balance = balance;
        self
    }

    pub fn catalog(mut self, catalog: CropCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn starting_region(mut self, region: RegionKind) -> Self {
        self.starting_region = region;
        self
    }

    /// Replaces the default water-then-growth pipeline once any system is added.
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn with_observer(mut self, observer: impl EngineObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn build(self) -> Result<TurnEngine, EngineError> {
        let farm = Farm::new(self.starting_region, &self.balance);
        self.assemble(farm)
    }

    /// Rebuilds an engine from a save. The save's mode and start date win over
    /// the builder's.
    pub fn restore(mut self, save: SaveState) -> Result<TurnEngine, EngineError> {
        if save.version != SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: save.version,
            }
            .into());
        }
        self.mode = save.mode;
        self.start_date = save.start_date;
        self.starting_region = save.farm.active_region;
        self.assemble(save.farm)
    }

    fn assemble(self, farm: Farm) -> Result<TurnEngine, EngineError> {
        self.balance.validate()?;
        self.catalog.validate()?;
        if let GameMode::FixedSeason { total_weeks: 0 } = self.mode {
            return Err(EngineError::InvalidMode(
                "a fixed season needs at least one week".into(),
            ));
        }
        validate_farm(&farm, self.mode, &self.balance)?;

        let systems = if self.systems.is_empty() {
            let defaults: Vec<Box<dyn System>> = vec![
                Box::new(WaterBalanceSystem::new()),
                Box::new(GrowthSystem::new()),
            ];
            defaults
        } else {
            self.systems
        };

        let mut engine = TurnEngine {
            mode: self.mode,
            balance: self.balance,
            catalog: self.catalog,
            calendar: Calendar::new(self.start_date),
            starting_region: self.starting_region,
            provider: self.provider,
            systems,
            observers: self.observers,
            farm,
            last_report: None,
        };
        if engine.farm.phase != Phase::Harvest {
            engine.refresh_environments();
        }
        Ok(engine)
    }
}

fn validate_farm(farm: &Farm, mode: GameMode, balance: &BalanceParameters) -> Result<(), SaveError> {
    let invalid = |reason: String| SaveError::Invalid(reason);
    if farm.regions.is_empty() {
        return Err(invalid("no region is unlocked".into()));
    }
    if !mode.is_endless() && farm.regions.len() != 1 {
        return Err(invalid("a fixed season plays exactly one region".into()));
    }
    for region in farm.regions.values() {
        region
            .check_layout(balance.max_plots_per_region)
            .map_err(invalid)?;
    }
    if !farm.is_region_unlocked(farm.active_region) {
        return Err(invalid(format!(
            "active region {} is not unlocked",
            farm.active_region
        )));
    }
    if farm.selected_plot >= balance.max_plots_per_region {
        return Err(invalid(format!(
            "selected plot {} is out of range",
            farm.selected_plot
        )));
    }
    if farm.phase == Phase::Resolving {
        return Err(invalid("saved in the middle of a resolve".into()));
    }
    match mode {
        GameMode::FixedSeason { total_weeks } => {
            let finished = farm.week_index >= total_weeks;
            match (farm.phase == Phase::Harvest, finished, farm.harvest.is_some()) {
                (true, true, true) | (false, false, false) => {}
                (true, _, false) => {
                    return Err(invalid("harvest phase without a stored score".into()));
                }
                (true, false, true) => {
                    return Err(invalid(format!(
                        "harvested at week {} of a {total_weeks}-week season",
                        farm.week_index
                    )));
                }
                (false, true, _) => {
                    return Err(invalid(format!(
                        "week {} is past the last playable week of a {total_weeks}-week season",
                        farm.week_index
                    )));
                }
                (false, false, true) => {
                    return Err(invalid("score stored before the season ended".into()));
                }
            }
        }
        GameMode::Endless => {
            if farm.phase == Phase::Harvest || farm.harvest.is_some() {
                return Err(invalid("endless sessions never reach the harvest phase".into()));
            }
        }
    }
    Ok(())
}

/// The turn state machine. Commands mutate the farm only when every
/// precondition holds; resolution runs the registered systems in order.
pub struct TurnEngine {
    mode: GameMode,
    balance: BalanceParameters,
    catalog: CropCatalog,
    calendar: Calendar,
    starting_region: RegionKind,
    provider: Box<dyn EnvironmentProvider>,
    systems: Vec<Box<dyn System>>,
    observers: Vec<Box<dyn EngineObserver>>,
    farm: Farm,
    last_report: Option<ResolutionReport>,
}

impl TurnEngine {
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.farm.phase
    }

    pub fn week_index(&self) -> u32 {
        self.farm.week_index
    }

    pub fn gold(&self) -> i64 {
        self.farm.gold
    }

    pub fn farm(&self) -> &Farm {
        &self.farm
    }

    pub fn balance(&self) -> &BalanceParameters {
        &self.balance
    }

    pub fn catalog(&self) -> &CropCatalog {
        &self.catalog
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn last_report(&self) -> Option<&ResolutionReport> {
        self.last_report.as_ref()
    }

    pub fn add_observer(&mut self, observer: impl EngineObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Final score of a finished fixed season.
    pub fn harvest_score(&self) -> Option<&scoring::HarvestScore> {
        self.farm.harvest.as_ref()
    }

    /// Cost of the next plot in the active region, or `None` at the cap.
    pub fn next_plot_cost(&self) -> Option<i64> {
        let region = self.farm.active_economy()?;
        let unlocked = region.unlocked_count();
        (unlocked < self.balance.max_plots_per_region).then(|| self.balance.plot_cost(unlocked))
    }

    /// Soil fraction a plot would show if queued irrigation soaked in now.
    /// Outside Planning nothing is queued and the stored fraction is returned.
    pub fn preview_soil_fraction(&self, index: usize) -> Option<f64> {
        let region = self.farm.active_economy()?;
        let plot = region.plot(index)?;
        if self.farm.phase != Phase::Planning {
            return Some(plot.soil_fraction);
        }
        let capacity_mm = self.balance.field_capacity.capacity_mm(plot.soil_texture);
        if capacity_mm <= 0.0 {
            return Some(0.0);
        }
        let preview = (plot.soil_fraction * capacity_mm + region.pending_irrigation(index)) / capacity_mm;
        Some(preview.clamp(0.0, 1.0))
    }

    pub fn save_state(&self) -> SaveState {
        SaveState {
            version: SAVE_VERSION,
            mode: self.mode,
            start_date: self.calendar.start(),
            farm: self.farm.clone(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let active = self.farm.active_region;
        let plots = self
            .farm
            .active_economy()
            .map(|region| {
                region
                    .plots()
                    .map(|plot| {
                        let crop = plot.crop.as_ref();
                        PlotView {
                            index: plot.id,
                            soil_texture: plot.soil_texture,
                            soil_fraction: plot.soil_fraction,
                            preview_soil_fraction: self
                                .preview_soil_fraction(plot.id)
                                .unwrap_or(plot.soil_fraction),
                            crop: crop.map(|crop| crop.crop_id.clone()),
                            planted_week: crop.map(|crop| crop.planted_week),
                            crop_age_weeks: crop.map_or(0, |crop| crop.age_weeks),
                            accumulated_growth: plot.accumulated_growth(),
                            maturity_target: crop.map_or(0.0, |crop| crop.maturity_target),
                            ready_for_harvest: plot.is_ready_for_harvest(),
                            suitability: crop.map(|crop| crop.suitability),
                            nitrogen_parts_applied: crop.map_or(0, |crop| crop.nitrogen_parts_applied()),
                            nitrogen_part_a_week: crop
                                .and_then(|crop| crop.nitrogen(NitrogenPart::A))
                                .map(|dose| dose.week),
                            nitrogen_part_b_week: crop
                                .and_then(|crop| crop.nitrogen(NitrogenPart::B))
                                .map(|dose| dose.week),
                            pending_leach_penalty: plot.pending_leach_penalty,
                            irrigation_events_this_week: plot.irrigation_events_this_week,
                            irrigation_mm_this_week: plot.irrigation_mm_this_week,
                            pending_irrigation_mm: region.pending_irrigation(plot.id),
                            runoff_event_count: plot.runoff_event_count,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let regions = RegionKind::ALL
            .iter()
            .map(|kind| {
                let economy = self.farm.region(*kind);
                RegionView {
                    kind: *kind,
                    name: kind.profile().display_name,
                    unlocked: economy.is_some(),
                    unlocked_plots: economy.map_or(0, |region| region.unlocked_count()),
                    unlock_cost: (self.mode.is_endless() && economy.is_none())
                        .then(|| self.balance.region_unlock_cost(*kind)),
                    environment: self.farm.environments.get(kind).copied(),
                }
            })
            .collect();

        EngineSnapshot {
            mode: self.mode,
            phase: self.farm.phase,
            week_index: self.farm.week_index,
            calendar: self.calendar.label(self.farm.week_index),
            gold: self.farm.gold,
            active_region: active,
            selected_plot: self.farm.selected_plot,
            environment: self.farm.environment(active),
            plots,
            regions,
            next_plot_cost: self.next_plot_cost(),
            harvest: self.farm.harvest.clone(),
        }
    }

    fn refresh_environments(&mut self) {
        let week = self.farm.week_index;
        for kind in self.farm.unlocked_regions() {
            let env = self.provider.weekly_environment(kind, week);
            self.farm.environments.insert(kind, env);
        }
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.farm.phase;
        if from == to {
            return;
        }
        self.farm.phase = to;
        info!(?from, ?to, week = self.farm.week_index, "phase changed");
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.phase_changed(from, to, &snapshot);
        }
    }

    fn emit(&mut self, cue: Cue) {
        for observer in &mut self.observers {
            observer.cue(&cue);
        }
    }

    fn commit_week(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let save = self.save_state();
        for observer in &mut self.observers {
            observer.week_committed(&save);
        }
    }

    /// Runs every system over the farm and records what happened.
    fn resolve_week(&mut self) -> ResolutionReport {
        let ctx = WeekContext {
            week: self.farm.week_index,
            balance: &self.balance,
            catalog: &self.catalog,
        };
        let mut report = ResolutionReport::new(ctx.week);
        for system in &mut self.systems {
            system.run(&ctx, &mut self.farm, &mut report);
        }
        report
    }

    fn advance_week(&mut self) {
        let leached = systems::settle_leaching(&mut self.farm);
        systems::reset_weekly_counters(&mut self.farm);
        self.farm.week_index += 1;

        if let GameMode::FixedSeason { total_weeks } = self.mode {
            if self.farm.week_index >= total_weeks {
                let score = scoring::season_harvest(&self.farm);
                info!(
                    harvest_gold = score.harvest_gold,
                    final_score = score.final_score,
                    leached,
                    "season harvested"
                );
                self.farm.harvest = Some(score);
                self.set_phase(Phase::Harvest);
                self.commit_week();
                return;
            }
        }

        self.refresh_environments();
        self.set_phase(Phase::Planning);
        self.commit_week();
    }

    fn reset(&mut self) {
        let from = self.farm.phase;
        self.farm = Farm::new(self.starting_region, &self.balance);
        self.farm.phase = from;
        self.last_report = None;
        self.refresh_environments();
        self.set_phase(Phase::Planning);
    }
}
