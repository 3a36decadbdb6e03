use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::animal::Animal;
use crate::cell::BiomeCell;
use crate::error::{SimError, SimResult};
use crate::island::{Coord, Island};
use crate::species::{Species, SpeciesRegistry};
use crate::terrain::{LandscapeRegistry, Terrain};

/// One animal to place on the island before (or between) simulated years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub coord: Coord,
    pub species: String,
    pub age: u32,
    pub weight: f64,
}

impl SeedRecord {
    pub fn new(coord: impl Into<Coord>, species: &str, age: u32, weight: f64) -> Self {
        Self {
            coord: coord.into(),
            species: species.to_string(),
            age,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellReport {
    pub coord: Coord,
    pub terrain: Terrain,
    pub fodder: f64,
    pub counts: BTreeMap<Species, usize>,
}

/// Population counts after a completed year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearReport {
    pub year: u64,
    pub total: usize,
    pub per_species: BTreeMap<Species, usize>,
    /// Habitable cells only, in row-major order.
    pub cells: Vec<CellReport>,
}

impl YearReport {
    pub fn count(&self, species: Species) -> usize {
        self.per_species.get(&species).copied().unwrap_or(0)
    }
}

/// Island state plus the constant tables that drive it.
#[derive(Debug, Clone)]
pub struct World {
    island: Island,
    species: SpeciesRegistry,
    landscapes: LandscapeRegistry,
    year: u64,
}

impl World {
    pub fn new(map: &str) -> SimResult<Self> {
        Self::with_registries(map, SpeciesRegistry::new(), LandscapeRegistry::new())
    }

    pub fn with_registries(
        map: &str,
        species: SpeciesRegistry,
        landscapes: LandscapeRegistry,
    ) -> SimResult<Self> {
        let island = Island::parse(map, &landscapes)?;
        info!(
            rows = island.rows(),
            cols = island.cols(),
            "island constructed"
        );
        Ok(Self {
            island,
            species,
            landscapes,
            year: 0,
        })
    }

    /// Number of years simulated so far.
    pub fn year(&self) -> u64 {
        self.year
    }

    pub fn island(&self) -> &Island {
        &self.island
    }

    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    pub fn landscapes(&self) -> &LandscapeRegistry {
        &self.landscapes
    }

    fn ensure_not_started(&self) -> SimResult<()> {
        if self.year > 0 {
            return Err(SimError::Argument(format!(
                "parameters are frozen once simulation has started (year {})",
                self.year
            )));
        }
        Ok(())
    }

    pub fn set_species_parameters<K, I>(&mut self, tag: &str, overrides: I) -> SimResult<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        self.ensure_not_started()?;
        self.species.set(tag, overrides)
    }

    /// Override landscape constants; fodder above a lowered maximum is cut back.
    pub fn set_landscape_parameters<K, I>(&mut self, tag: &str, overrides: I) -> SimResult<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        self.ensure_not_started()?;
        let terrain = self.landscapes.set(tag, overrides)?;
        let f_max = self.landscapes.get(terrain).f_max;
        for cell in self.island.cells_mut() {
            if cell.terrain() == terrain {
                cell.clamp_fodder(f_max);
            }
        }
        Ok(())
    }

    /// Place animals on the island. Every record is checked before any is
    /// placed, so a failing batch leaves the world untouched.
    pub fn add_population(&mut self, records: &[SeedRecord]) -> SimResult<usize> {
        let mut placed = Vec::with_capacity(records.len());
        for record in records {
            let cell = self.island.cell(record.coord)?;
            let species: Species = record.species.parse()?;
            if !cell.terrain().is_habitable() {
                return Err(SimError::Placement {
                    species: species.to_string(),
                    terrain: cell.terrain().to_string(),
                    coord: record.coord,
                });
            }
            if !record.weight.is_finite() || record.weight <= 0.0 {
                return Err(SimError::Argument(format!(
                    "seed weight must be positive, got {} at {}",
                    record.weight, record.coord
                )));
            }
            placed.push((
                record.coord,
                Animal::new(species, record.age, record.weight),
            ));
        }

        let count = placed.len();
        for (coord, animal) in placed {
            self.island.cell_mut(coord)?.admit(animal);
        }
        Ok(count)
    }

    pub fn total_animals(&self) -> usize {
        self.island.cells().iter().map(BiomeCell::total).sum()
    }

    pub fn count(&self, species: Species) -> usize {
        self.island.count(species)
    }

    pub fn counts_per_species(&self) -> BTreeMap<Species, usize> {
        Species::ALL
            .into_iter()
            .map(|species| (species, self.count(species)))
            .collect()
    }

    pub fn report(&self) -> YearReport {
        let cells = self
            .island
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.terrain().is_habitable())
            .map(|(index, cell)| CellReport {
                coord: self.island.coord(index),
                terrain: cell.terrain(),
                fodder: cell.fodder(),
                counts: Species::ALL
                    .into_iter()
                    .map(|species| (species, cell.count(species)))
                    .collect(),
            })
            .collect();
        YearReport {
            year: self.year,
            total: self.total_animals(),
            per_species: self.counts_per_species(),
            cells,
        }
    }

    pub(crate) fn split_mut(&mut self) -> (&mut Island, &SpeciesRegistry, &LandscapeRegistry) {
        (&mut self.island, &self.species, &self.landscapes)
    }

    pub(crate) fn finish_year(&mut self) {
        self.year += 1;
    }
}
