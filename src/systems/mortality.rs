use crate::{
    engine::{System, SystemContext, YearPhase},
    world::World,
};

use super::for_each_cell;

pub struct MortalitySystem;

impl MortalitySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MortalitySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MortalitySystem {
    fn name(&self) -> &str {
        "mortality"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::ComputeDeaths
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        for_each_cell(ctx, world, |cell, species, _, rng| cell.apply_deaths(species, rng))
    }
}
