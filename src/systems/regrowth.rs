use crate::{
    engine::{System, SystemContext, YearPhase},
    world::World,
};

use super::for_each_cell;

pub struct RegrowthSystem;

impl RegrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegrowthSystem {
    fn name(&self) -> &str {
        "regrowth"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::RegrowFodder
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        for_each_cell(ctx, world, |cell, _, landscapes, _| {
            cell.regrow(landscapes.get(cell.terrain()));
            0
        })
    }
}
