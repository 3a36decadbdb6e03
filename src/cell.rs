//! A single biome cell and the cell-local yearly phases.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::animal::{kill_probability, Animal};
use crate::rng::RngExt;
use crate::species::{Diet, Species, SpeciesRegistry};
use crate::terrain::{LandscapeParams, Terrain};

#[derive(Debug, Clone, PartialEq)]
pub struct BiomeCell {
    terrain: Terrain,
    fodder: f64,
    residents: BTreeMap<Species, Vec<Animal>>,
}

impl BiomeCell {
    pub fn new(terrain: Terrain, landscape: &LandscapeParams) -> Self {
        let fodder = if terrain.grows_fodder() {
            landscape.f_max
        } else {
            0.0
        };
        Self {
            terrain,
            fodder,
            residents: BTreeMap::new(),
        }
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn fodder(&self) -> f64 {
        self.fodder
    }

    pub fn residents(&self, species: Species) -> &[Animal] {
        self.residents
            .get(&species)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, species: Species) -> usize {
        self.residents(species).len()
    }

    pub fn total(&self) -> usize {
        self.residents.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Food a migrant of `species` would find here: fodder for grazers,
    /// prey biomass for hunters.
    pub fn food_for(&self, species: Species) -> f64 {
        match species.diet() {
            Diet::Fodder => self.fodder,
            Diet::Prey => self
                .residents
                .iter()
                .filter(|(s, _)| s.diet() == Diet::Fodder)
                .flat_map(|(_, animals)| animals.iter())
                .map(Animal::weight)
                .sum(),
        }
    }

    pub(crate) fn admit(&mut self, animal: Animal) {
        debug_assert!(self.terrain.is_habitable());
        self.residents
            .entry(animal.species())
            .or_default()
            .push(animal);
    }

    /// Remove the animals at `indices` (ascending) of `species`, in order.
    pub(crate) fn release(&mut self, species: Species, indices: &[usize]) -> Vec<Animal> {
        let Some(animals) = self.residents.get_mut(&species) else {
            return Vec::new();
        };
        let mut leaving = Vec::with_capacity(indices.len());
        let mut staying = Vec::with_capacity(animals.len() - indices.len());
        let mut next = indices.iter().peekable();
        for (index, animal) in animals.drain(..).enumerate() {
            if next.peek() == Some(&&index) {
                next.next();
                leaving.push(animal);
            } else {
                staying.push(animal);
            }
        }
        *animals = staying;
        leaving
    }

    pub(crate) fn clamp_fodder(&mut self, f_max: f64) {
        self.fodder = self.fodder.min(f_max).max(0.0);
    }

    pub fn regrow(&mut self, landscape: &LandscapeParams) {
        self.fodder = landscape.regrow(self.terrain, self.fodder);
    }

    /// Grazers eat in a fresh random order each year. Returns fodder eaten.
    pub fn feed_herbivores<R: Rng>(&mut self, registry: &SpeciesRegistry, rng: &mut R) -> f64 {
        let start = self.fodder;
        for (species, animals) in self.residents.iter_mut() {
            if species.diet() != Diet::Fodder {
                continue;
            }
            let params = registry.get(*species);
            animals.shuffle(rng);
            for animal in animals.iter_mut() {
                let eaten = params.appetite.min(self.fodder);
                self.fodder -= eaten;
                animal.feed(eaten, params);
            }
        }
        let eaten = start - self.fodder;
        debug_assert!(eaten <= start + 1e-9);
        eaten
    }

    /// Hunters, in random order, work through the prey from weakest to
    /// strongest until sated. Returns the number of prey killed.
    pub fn feed_carnivores<R: Rng>(&mut self, registry: &SpeciesRegistry, rng: &mut R) -> usize {
        let mut prey: Vec<(Species, usize, f64, f64)> = self
            .residents
            .iter()
            .filter(|(species, _)| species.diet() == Diet::Fodder)
            .flat_map(|(species, animals)| {
                let params = registry.get(*species);
                animals.iter().enumerate().map(move |(index, animal)| {
                    (*species, index, animal.fitness(params), animal.weight())
                })
            })
            .collect();
        if prey.is_empty() {
            return 0;
        }
        prey.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut killed: BTreeSet<(Species, usize)> = BTreeSet::new();
        let hunters: Vec<Species> = self
            .residents
            .keys()
            .copied()
            .filter(|species| species.diet() == Diet::Prey)
            .collect();
        for species in hunters {
            let params = registry.get(species);
            let Some(animals) = self.residents.get_mut(&species) else {
                continue;
            };
            animals.shuffle(rng);
            for hunter in animals.iter_mut() {
                let mut eaten = 0.0;
                for &(prey_species, index, prey_fitness, prey_weight) in &prey {
                    if eaten >= params.appetite {
                        break;
                    }
                    if killed.contains(&(prey_species, index)) {
                        continue;
                    }
                    let p = kill_probability(hunter.fitness(params), prey_fitness, params);
                    debug_assert!((0.0..=1.0).contains(&p));
                    if rng.chance(p) {
                        killed.insert((prey_species, index));
                        let portion = prey_weight.min(params.appetite - eaten);
                        eaten += portion;
                        hunter.feed(portion, params);
                    }
                }
            }
        }

        for (species, animals) in self.residents.iter_mut() {
            let mut index = 0;
            animals.retain(|_| {
                let keep = !killed.contains(&(*species, index));
                index += 1;
                keep
            });
        }
        killed.len()
    }

    /// Every resident present at the start of the phase may give birth;
    /// newborns join afterwards. Returns the number of births.
    pub fn procreate<R: Rng>(&mut self, registry: &SpeciesRegistry, rng: &mut R) -> usize {
        let mut births = 0;
        for (species, animals) in self.residents.iter_mut() {
            let params = registry.get(*species);
            let population = animals.len();
            let newborns: Vec<Animal> = animals
                .iter_mut()
                .filter_map(|parent| parent.give_birth(params, population, rng))
                .collect();
            births += newborns.len();
            animals.extend(newborns);
        }
        births
    }

    pub fn age_and_lose_weight(&mut self, registry: &SpeciesRegistry) {
        for (species, animals) in self.residents.iter_mut() {
            let params = registry.get(*species);
            for animal in animals.iter_mut() {
                animal.age_one_year();
                animal.lose_annual_weight(params);
            }
        }
    }

    /// Remove residents that die this year. Starved animals always die.
    pub fn apply_deaths<R: Rng>(&mut self, registry: &SpeciesRegistry, rng: &mut R) -> usize {
        let before = self.total();
        for (species, animals) in self.residents.iter_mut() {
            let params = registry.get(*species);
            animals.retain(|animal| {
                let p = animal.death_probability(params);
                debug_assert!((0.0..=1.0).contains(&p));
                !(animal.is_starved() || rng.chance(p))
            });
        }
        before - self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;
    use crate::terrain::LandscapeRegistry;

    fn jungle() -> BiomeCell {
        BiomeCell::new(
            Terrain::Jungle,
            LandscapeRegistry::new().get(Terrain::Jungle),
        )
    }

    fn herd(cell: &mut BiomeCell, species: Species, count: usize, weight: f64) {
        for _ in 0..count {
            cell.admit(Animal::new(species, 5, weight));
        }
    }

    #[test]
    fn new_cells_start_full() {
        assert_eq!(jungle().fodder(), 800.0);
        let desert = BiomeCell::new(
            Terrain::Desert,
            LandscapeRegistry::new().get(Terrain::Desert),
        );
        assert_eq!(desert.fodder(), 0.0);
    }

    #[test]
    fn herbivores_never_eat_more_than_available() {
        let registry = SpeciesRegistry::new();
        let mut rng = RngManager::new(1).cell_rng(0, 0, 0);
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 85, 20.0);

        let eaten = cell.feed_herbivores(&registry, &mut rng);
        assert_eq!(eaten, 800.0);
        assert_eq!(cell.fodder(), 0.0);

        let fed = cell
            .residents(Species::Herbivore)
            .iter()
            .filter(|a| a.weight() > 20.0)
            .count();
        assert_eq!(fed, 80);
    }

    #[test]
    fn carnivores_only_kill_weaker_prey() {
        let registry = SpeciesRegistry::new();
        let mut rng = RngManager::new(2).cell_rng(0, 0, 0);
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 10, 50.0);
        cell.admit(Animal::new(Species::Carnivore, 5, 0.5));

        assert_eq!(cell.feed_carnivores(&registry, &mut rng), 0);
        assert_eq!(cell.count(Species::Herbivore), 10);
    }

    #[test]
    fn certain_kills_stop_at_appetite() {
        let mut registry = SpeciesRegistry::new();
        registry.set("Carnivore", [("DeltaPhiMax", 1e-6)]).unwrap();
        let mut rng = RngManager::new(2).cell_rng(0, 0, 0);
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 10, 4.0);
        cell.admit(Animal::new(Species::Carnivore, 5, 40.0));

        let killed = cell.feed_carnivores(&registry, &mut rng);
        // 50 appetite at 4 per prey: 13 would be needed, only 10 exist.
        assert_eq!(killed, 10);
        assert_eq!(cell.count(Species::Herbivore), 0);
        let hunter = &cell.residents(Species::Carnivore)[0];
        assert!((hunter.weight() - (40.0 + 0.75 * 40.0)).abs() < 1e-9);
    }

    #[test]
    fn procreation_uses_start_of_phase_population() {
        let mut registry = SpeciesRegistry::new();
        registry.set("Herbivore", [("gamma", 10.0)]).unwrap();
        let mut rng = RngManager::new(4).cell_rng(0, 0, 0);
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 4, 60.0);

        let births = cell.procreate(&registry, &mut rng);
        assert_eq!(births, 4);
        assert_eq!(cell.count(Species::Herbivore), 8);
        let newborns = cell
            .residents(Species::Herbivore)
            .iter()
            .filter(|a| a.age() == 0)
            .count();
        assert_eq!(newborns, 4);
    }

    #[test]
    fn lone_animals_do_not_procreate() {
        let registry = SpeciesRegistry::new();
        let mut rng = RngManager::new(4).cell_rng(0, 0, 0);
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 1, 60.0);
        assert_eq!(cell.procreate(&registry, &mut rng), 0);
    }

    #[test]
    fn starved_animals_always_die() {
        let mut registry = SpeciesRegistry::new();
        registry.set("Herbivore", [("omega", 0.0)]).unwrap();
        let mut rng = RngManager::new(6).cell_rng(0, 0, 0);
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 3, 20.0);
        cell.admit(Animal::new(Species::Herbivore, 5, 0.0));

        assert_eq!(cell.apply_deaths(&registry, &mut rng), 1);
        assert_eq!(cell.count(Species::Herbivore), 3);
    }

    #[test]
    fn release_preserves_order() {
        let mut cell = jungle();
        for weight in [1.0, 2.0, 3.0, 4.0, 5.0] {
            cell.admit(Animal::new(Species::Herbivore, 0, weight));
        }
        let leaving = cell.release(Species::Herbivore, &[1, 3]);
        let left: Vec<f64> = leaving.iter().map(Animal::weight).collect();
        let stayed: Vec<f64> = cell
            .residents(Species::Herbivore)
            .iter()
            .map(Animal::weight)
            .collect();
        assert_eq!(left, vec![2.0, 4.0]);
        assert_eq!(stayed, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn prey_biomass_is_carnivore_food() {
        let mut cell = jungle();
        herd(&mut cell, Species::Herbivore, 3, 10.0);
        assert_eq!(cell.food_for(Species::Carnivore), 30.0);
        assert_eq!(cell.food_for(Species::Herbivore), 800.0);
    }
}
