//! Island geography: a dense grid of biome cells with 4-neighbour adjacency.
//!
//! Migration is split into a read-only planning pass over every cell and a
//! commit pass that moves animals afterwards, so no cell ever sees another
//! cell's arrivals from the same year.

use std::collections::BTreeMap;
use std::fmt;

use rand::distributions::{Distribution, WeightedIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animal::Animal;
use crate::cell::BiomeCell;
use crate::error::{SimError, SimResult};
use crate::rng::{RngExt, RngManager, StreamId};
use crate::species::{Species, SpeciesParams, SpeciesRegistry};
use crate::terrain::{LandscapeRegistry, Terrain};

/// Largest exponent fed to `exp` when computing propensities.
const MAX_PROPENSITY_EXPONENT: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// One decided move: animal `index` of `species` in cell `from` goes to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub from: usize,
    pub species: Species,
    pub index: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
pub struct Island {
    rows: usize,
    cols: usize,
    cells: Vec<BiomeCell>,
}

impl Island {
    /// Build an island from newline-separated rows of terrain letters.
    /// Surrounding whitespace and blank lines are ignored.
    pub fn parse(map: &str, landscapes: &LandscapeRegistry) -> SimResult<Self> {
        let lines: Vec<&str> = map
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(SimError::Geometry("map has no rows".into()));
        };
        let cols = first.chars().count();
        let rows = lines.len();

        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(SimError::Geometry(format!(
                    "row {row} has length {width}, expected {cols}"
                )));
            }
            for (col, letter) in line.chars().enumerate() {
                let terrain = Terrain::from_letter(letter).ok_or_else(|| {
                    SimError::Geometry(format!("unknown terrain '{letter}' at ({row}, {col})"))
                })?;
                let on_border = row == 0 || col == 0 || row + 1 == rows || col + 1 == cols;
                if on_border && terrain != Terrain::OutOfBounds {
                    return Err(SimError::Geometry(format!(
                        "border cell ({row}, {col}) is {terrain}, expected OutOfBounds"
                    )));
                }
                cells.push(BiomeCell::new(terrain, landscapes.get(terrain)));
            }
        }

        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index(&self, coord: Coord) -> SimResult<usize> {
        if coord.row < self.rows && coord.col < self.cols {
            Ok(coord.row * self.cols + coord.col)
        } else {
            Err(SimError::Bounds {
                coord,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn coord(&self, index: usize) -> Coord {
        Coord::new(index / self.cols, index % self.cols)
    }

    pub fn cell(&self, coord: Coord) -> SimResult<&BiomeCell> {
        let index = self.index(coord)?;
        Ok(&self.cells[index])
    }

    pub(crate) fn cell_mut(&mut self, coord: Coord) -> SimResult<&mut BiomeCell> {
        let index = self.index(coord)?;
        Ok(&mut self.cells[index])
    }

    pub fn cells(&self) -> &[BiomeCell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [BiomeCell] {
        &mut self.cells
    }

    /// In-grid 4-neighbours of `index` that are not OutOfBounds,
    /// in north, south, west, east order.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let Coord { row, col } = self.coord(index);
        let mut neighbors = Vec::with_capacity(4);
        if row > 0 {
            neighbors.push(index - self.cols);
        }
        if row + 1 < self.rows {
            neighbors.push(index + self.cols);
        }
        if col > 0 {
            neighbors.push(index - 1);
        }
        if col + 1 < self.cols {
            neighbors.push(index + 1);
        }
        neighbors.retain(|&n| self.cells[n].terrain() != Terrain::OutOfBounds);
        neighbors
    }

    /// Relative attractiveness of cell `target` to a migrant of `species`.
    /// Zero when the terrain cannot host animals.
    pub fn propensity(&self, target: usize, species: Species, params: &SpeciesParams) -> f64 {
        let cell = &self.cells[target];
        if !cell.terrain().is_habitable() {
            return 0.0;
        }
        let crowd = (cell.count(species) + 1) as f64;
        let abundance = if params.appetite > 0.0 {
            cell.food_for(species) / (crowd * params.appetite)
        } else {
            0.0
        };
        (params.lambda * abundance)
            .min(MAX_PROPENSITY_EXPONENT)
            .exp()
    }

    /// Decide every move for this year from the current state, without
    /// mutating anything.
    pub fn plan_migration(
        &self,
        registry: &SpeciesRegistry,
        rng: &RngManager,
        stream: StreamId,
        year: u64,
    ) -> Vec<Migration> {
        let per_cell: Vec<Vec<Migration>> = (0..self.cells.len())
            .into_par_iter()
            .map(|from| self.plan_cell(from, registry, rng, stream, year))
            .collect();
        per_cell.into_iter().flatten().collect()
    }

    fn plan_cell(
        &self,
        from: usize,
        registry: &SpeciesRegistry,
        rng: &RngManager,
        stream: StreamId,
        year: u64,
    ) -> Vec<Migration> {
        let cell = &self.cells[from];
        if !cell.terrain().is_habitable() || cell.is_empty() {
            return Vec::new();
        }
        let mut cell_rng = rng.cell_rng(stream, from, year);
        let neighbors = self.neighbors(from);
        let mut moves = Vec::new();

        for species in Species::ALL {
            let residents = cell.residents(species);
            if residents.is_empty() {
                continue;
            }
            let params = registry.get(species);
            let weights: Vec<f64> = neighbors
                .iter()
                .map(|&n| self.propensity(n, species, params))
                .collect();
            let chooser = WeightedIndex::new(&weights).ok();

            for (index, animal) in residents.iter().enumerate() {
                if !cell_rng.chance(animal.movement_probability(params)) {
                    continue;
                }
                let Some(chooser) = chooser.as_ref() else {
                    continue;
                };
                let to = neighbors[chooser.sample(&mut cell_rng)];
                debug_assert!(self.cells[to].terrain().is_habitable());
                moves.push(Migration {
                    from,
                    species,
                    index,
                    to,
                });
            }
        }
        moves
    }

    /// Apply planned moves. Returns the number of animals moved.
    pub fn commit_migration(&mut self, moves: &[Migration]) -> usize {
        let mut grouped: BTreeMap<(usize, Species), Vec<(usize, usize)>> = BTreeMap::new();
        for m in moves {
            grouped
                .entry((m.from, m.species))
                .or_default()
                .push((m.index, m.to));
        }

        let mut arrivals: Vec<(usize, Animal)> = Vec::with_capacity(moves.len());
        for ((from, species), mut group) in grouped {
            group.sort_unstable();
            let indices: Vec<usize> = group.iter().map(|&(index, _)| index).collect();
            let leaving = self.cells[from].release(species, &indices);
            arrivals.extend(group.iter().map(|&(_, to)| to).zip(leaving));
        }

        let moved = arrivals.len();
        for (to, animal) in arrivals {
            self.cells[to].admit(animal);
        }
        moved
    }

    pub fn count(&self, species: Species) -> usize {
        self.cells.iter().map(|cell| cell.count(species)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn island(map: &str) -> Island {
        Island::parse(map, &LandscapeRegistry::new()).expect("valid map")
    }

    fn restless() -> SpeciesRegistry {
        // Fitness is exactly 1 for heavy animals, so every animal moves.
        let mut registry = SpeciesRegistry::new();
        registry
            .set(
                "Herbivore",
                [("mu", 1.0), ("a_half", 1000.0), ("phi_weight", 1.0)],
            )
            .unwrap();
        registry
    }

    fn populate(island: &mut Island, coord: Coord, count: usize) {
        let cell = island.cell_mut(coord).unwrap();
        for _ in 0..count {
            cell.admit(Animal::new(Species::Herbivore, 1, 200.0));
        }
    }

    #[test]
    fn parses_rectangular_enclosed_maps() {
        let island = island(
            "
            XXXXX
            XJSDX
            XMOJX
            XXXXX
            ",
        );
        assert_eq!((island.rows(), island.cols()), (4, 5));
        assert_eq!(
            island.cell(Coord::new(1, 2)).unwrap().terrain(),
            Terrain::Savannah
        );
        assert_eq!(island.cell(Coord::new(1, 1)).unwrap().fodder(), 800.0);
    }

    #[test]
    fn rejects_malformed_maps() {
        let landscapes = LandscapeRegistry::new();
        for map in ["", "XXX\nXJ\nXXX", "XXX\nXJX\nXJX", "XXX\nXQX\nXXX", "OOO\nOJO\nOOO"] {
            assert!(
                matches!(Island::parse(map, &landscapes), Err(SimError::Geometry(_))),
                "{map:?} should be rejected"
            );
        }
    }

    #[test]
    fn out_of_grid_coordinates_fail() {
        let island = island("XXX\nXJX\nXXX");
        assert!(matches!(
            island.cell(Coord::new(3, 0)),
            Err(SimError::Bounds { rows: 3, cols: 3, .. })
        ));
    }

    #[test]
    fn neighbors_skip_out_of_bounds() {
        let island = island("XXXX\nXJJX\nXOJX\nXXXX");
        let index = island.index(Coord::new(1, 1)).unwrap();
        let neighbors: Vec<Coord> = island
            .neighbors(index)
            .into_iter()
            .map(|n| island.coord(n))
            .collect();
        assert_eq!(neighbors, vec![Coord::new(2, 1), Coord::new(1, 2)]);
    }

    #[test]
    fn ocean_has_no_propensity() {
        let island = island("XXXX\nXJOX\nXXXX");
        let params = SpeciesParams::herbivore();
        let ocean = island.index(Coord::new(1, 2)).unwrap();
        let jungle = island.index(Coord::new(1, 1)).unwrap();
        assert_eq!(island.propensity(ocean, Species::Herbivore, &params), 0.0);
        assert!(island.propensity(jungle, Species::Herbivore, &params) > 1.0);
    }

    #[test]
    fn animals_stay_without_habitable_neighbors() {
        let mut island = island("XXXXX\nXOJOX\nXXXXX");
        populate(&mut island, Coord::new(1, 2), 10);
        let moves = island.plan_migration(&restless(), &RngManager::new(1), 7, 1);
        assert!(moves.is_empty());
    }

    #[test]
    fn every_animal_moves_at_most_once() {
        let mut island = island("XXXX\nXJJX\nXXXX");
        populate(&mut island, Coord::new(1, 1), 20);

        let moves = island.plan_migration(&restless(), &RngManager::new(1), 7, 1);
        assert_eq!(moves.len(), 20);
        assert_eq!(island.commit_migration(&moves), 20);

        assert_eq!(island.cell(Coord::new(1, 1)).unwrap().total(), 0);
        assert_eq!(island.cell(Coord::new(1, 2)).unwrap().total(), 20);
    }

    #[test]
    fn planning_does_not_mutate() {
        let mut island = island("XXXX\nXJJX\nXXXX");
        populate(&mut island, Coord::new(1, 1), 5);
        populate(&mut island, Coord::new(1, 2), 3);
        let before = island.cells().to_vec();

        let moves = island.plan_migration(&restless(), &RngManager::new(1), 7, 1);
        assert_eq!(moves.len(), 8);
        assert_eq!(island.cells(), before.as_slice());

        island.commit_migration(&moves);
        assert_eq!(island.cell(Coord::new(1, 1)).unwrap().total(), 3);
        assert_eq!(island.cell(Coord::new(1, 2)).unwrap().total(), 5);
    }

    #[test]
    fn migrants_prefer_uncrowded_food() {
        let mut island = island(
            "
            XXXXX
            XXJXX
            XOJJX
            XXOXX
            XXXXX
            ",
        );
        populate(&mut island, Coord::new(1, 2), 100);
        populate(&mut island, Coord::new(2, 2), 50);
        let centre = island.index(Coord::new(2, 2)).unwrap();
        let crowded = island.index(Coord::new(1, 2)).unwrap();
        let empty = island.index(Coord::new(2, 3)).unwrap();

        let moves = island.plan_migration(&restless(), &RngManager::new(3), 7, 1);
        let from_centre: Vec<_> = moves.iter().filter(|m| m.from == centre).collect();
        let to_empty = from_centre.iter().filter(|m| m.to == empty).count();
        let to_crowded = from_centre.iter().filter(|m| m.to == crowded).count();

        assert_eq!(from_centre.len(), 50);
        assert!(to_empty > to_crowded);
    }
}
