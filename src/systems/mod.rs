mod ageing;
mod feeding;
mod migration;
mod mortality;
mod procreation;
mod regrowth;

pub use ageing::AgeingSystem;
pub use feeding::{CarnivoreFeedingSystem, HerbivoreFeedingSystem};
pub use migration::MigrationSystem;
pub use mortality::MortalitySystem;
pub use procreation::ProcreationSystem;
pub use regrowth::RegrowthSystem;

use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::cell::BiomeCell;
use crate::engine::SystemContext;
use crate::species::SpeciesRegistry;
use crate::terrain::LandscapeRegistry;
use crate::world::World;

/// Run a cell-local phase over every habitable cell in parallel, each cell
/// with its own derived RNG stream. Returns the summed event counts.
fn for_each_cell<F>(ctx: &SystemContext, world: &mut World, phase: F) -> usize
where
    F: Fn(&mut BiomeCell, &SpeciesRegistry, &LandscapeRegistry, &mut ChaCha8Rng) -> usize
        + Sync,
{
    let (island, species, landscapes) = world.split_mut();
    island
        .cells_mut()
        .par_iter_mut()
        .enumerate()
        .filter(|(_, cell)| cell.terrain().is_habitable())
        .map(|(index, cell)| {
            let mut rng = ctx.rng.cell_rng(ctx.stream, index, ctx.year);
            phase(cell, species, landscapes, &mut rng)
        })
        .sum()
}
