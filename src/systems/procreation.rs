use crate::{
    engine::{System, SystemContext, YearPhase},
    world::World,
};

use super::for_each_cell;

pub struct ProcreationSystem;

impl ProcreationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcreationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProcreationSystem {
    fn name(&self) -> &str {
        "procreation"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::Procreate
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        for_each_cell(ctx, world, |cell, species, _, rng| cell.procreate(species, rng))
    }
}
