use tracing::trace;

use crate::{
    engine::{System, SystemContext, YearPhase},
    world::World,
};

use super::for_each_cell;

pub struct HerbivoreFeedingSystem;

impl HerbivoreFeedingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HerbivoreFeedingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HerbivoreFeedingSystem {
    fn name(&self) -> &str {
        "herbivore_feeding"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::FeedHerbivores
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        for_each_cell(ctx, world, |cell, species, _, rng| {
            let eaten = cell.feed_herbivores(species, rng);
            trace!(year = ctx.year, eaten, remaining = cell.fodder(), "grazing");
            0
        })
    }
}

pub struct CarnivoreFeedingSystem;

impl CarnivoreFeedingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CarnivoreFeedingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CarnivoreFeedingSystem {
    fn name(&self) -> &str {
        "carnivore_feeding"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::FeedCarnivores
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        for_each_cell(ctx, world, |cell, species, _, rng| {
            cell.feed_carnivores(species, rng)
        })
    }
}
