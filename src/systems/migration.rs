use tracing::trace;

use crate::{
    engine::{System, SystemContext, YearPhase},
    world::World,
};

pub struct MigrationSystem;

impl MigrationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MigrationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MigrationSystem {
    fn name(&self) -> &str {
        "migration"
    }

    fn phase(&self) -> YearPhase {
        YearPhase::Migrate
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> usize {
        let (island, species, _) = world.split_mut();
        let moves = island.plan_migration(species, ctx.rng, ctx.stream, ctx.year);
        trace!(year = ctx.year, planned = moves.len(), "migration planned");
        island.commit_migration(&moves)
    }
}
