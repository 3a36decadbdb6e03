use crate::{
    engine::{System, SystemContext, YearPhase},
    world::World,
};

use super::for_each_cell;

pub struct AgeingSystem;

impl AgeingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgeingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AgeingSystem {
    fn name(&self) -> &str {
        "ageing"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::AgeAndLoseWeight
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        for_each_cell(ctx, world, |cell, species, _, _| {
            cell.age_and_lose_weight(species);
            0
        })
    }
}
