//! Yearly cycle orchestration.
//!
//! The engine owns one system per yearly phase and always runs them in the
//! order given by [`YearPhase::ALL`]; each phase reads the state the previous
//! one left behind.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{SimError, SimResult};
use crate::rng::{RngManager, StreamId};
use crate::species::Species;
use crate::systems::{
    AgeingSystem, CarnivoreFeedingSystem, HerbivoreFeedingSystem, MigrationSystem,
    MortalitySystem, ProcreationSystem, RegrowthSystem,
};
use crate::world::{World, YearReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum YearPhase {
    RegrowFodder,
    FeedHerbivores,
    FeedCarnivores,
    Procreate,
    AgeAndLoseWeight,
    ComputeDeaths,
    Migrate,
}

impl YearPhase {
    pub const ALL: [YearPhase; 7] = [
        YearPhase::RegrowFodder,
        YearPhase::FeedHerbivores,
        YearPhase::FeedCarnivores,
        YearPhase::Procreate,
        YearPhase::AgeAndLoseWeight,
        YearPhase::ComputeDeaths,
        YearPhase::Migrate,
    ];

    /// RNG stream the phase draws from.
    pub fn stream_id(self) -> StreamId {
        self as StreamId + 1
    }
}

pub struct SystemContext<'a> {
    /// The year being simulated, starting at 1.
    pub year: u64,
    pub stream: StreamId,
    pub rng: &'a RngManager,
}

pub trait System {
    fn name(&self) -> &str;
    fn phase(&self) -> YearPhase;
    /// Run the phase over the whole island. Returns the number of discrete
    /// events (births, deaths, kills, moves) the phase produced.
    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize;
}

#[derive(Clone, Debug)]
pub struct SystemRunReport {
    pub name: String,
    pub events: usize,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct YearSummary {
    pub year: u64,
    pub system_reports: Vec<SystemRunReport>,
    pub report: YearReport,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
}

impl Engine {
    pub fn new(seed: u64) -> Self {
        let systems: Vec<Box<dyn System>> = vec![
            Box::new(RegrowthSystem::new()),
            Box::new(HerbivoreFeedingSystem::new()),
            Box::new(CarnivoreFeedingSystem::new()),
            Box::new(ProcreationSystem::new()),
            Box::new(AgeingSystem::new()),
            Box::new(MortalitySystem::new()),
            Box::new(MigrationSystem::new()),
        ];
        debug_assert!(systems
            .iter()
            .map(|system| system.phase())
            .eq(YearPhase::ALL));
        Self {
            rng: RngManager::new(seed),
            systems,
        }
    }

    pub fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    pub fn phases(&self) -> Vec<YearPhase> {
        self.systems.iter().map(|system| system.phase()).collect()
    }

    /// Simulate exactly one year.
    pub fn step(&mut self, world: &mut World) -> YearSummary {
        let year = world.year() + 1;
        let before = world.counts_per_species();
        let mut system_reports = Vec::with_capacity(self.systems.len());

        for system in self.systems.iter_mut() {
            let ctx = SystemContext {
                year,
                stream: system.phase().stream_id(),
                rng: &self.rng,
            };
            let start = Instant::now();
            let events = system.run(&ctx, world);
            let elapsed = start.elapsed();
            debug!(year, phase = system.name(), events, "phase complete");
            system_reports.push(SystemRunReport {
                name: system.name().to_string(),
                events,
                duration_ms: elapsed.as_secs_f64() * 1_000.0,
            });
        }

        world.finish_year();
        let report = world.report();
        log_year(&before, &report);

        YearSummary {
            year,
            system_reports,
            report,
        }
    }

    /// Run `years` more years and return the report of the last one.
    pub fn advance(&mut self, world: &mut World, years: i64) -> SimResult<YearReport> {
        self.run_with_hook(world, years, |_| {})
    }

    /// Like [`Engine::advance`], calling `hook` with every year's report.
    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        years: i64,
        mut hook: F,
    ) -> SimResult<YearReport>
    where
        F: FnMut(&YearReport),
    {
        if years < 0 {
            return Err(SimError::Argument(format!(
                "year count must be non-negative, got {years}"
            )));
        }
        let mut last = None;
        for _ in 0..years {
            let summary = self.step(world);
            hook(&summary.report);
            last = Some(summary.report);
        }
        Ok(last.unwrap_or_else(|| world.report()))
    }
}

fn log_year(before: &BTreeMap<Species, usize>, report: &YearReport) {
    debug!(
        year = report.year,
        herbivores = report.count(Species::Herbivore),
        carnivores = report.count(Species::Carnivore),
        "year complete"
    );
    for (species, &count) in before {
        if count > 0 && report.count(*species) == 0 {
            warn!(year = report.year, species = %species, "species went extinct");
        }
    }
}
