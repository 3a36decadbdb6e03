//! Individual animals and their lifecycle formulas.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::RngExt;
use crate::species::{Species, SpeciesParams};

/// Floor used when every birth weight draw comes out non-positive.
const MIN_BIRTH_WEIGHT: f64 = 1e-3;
const BIRTH_WEIGHT_DRAWS: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    species: Species,
    age: u32,
    weight: f64,
}

fn logistic(x: f64, half: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (steepness * (x - half)).exp())
}

impl Animal {
    pub fn new(species: Species, age: u32, weight: f64) -> Self {
        Self {
            species,
            age,
            weight,
        }
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_starved(&self) -> bool {
        self.weight <= 0.0
    }

    /// Product of a falling age curve and a rising weight curve, in [0, 1].
    pub fn fitness(&self, params: &SpeciesParams) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let young = logistic(self.age as f64, params.a_half, params.phi_age);
        let heavy = logistic(self.weight, params.w_half, -params.phi_weight);
        young * heavy
    }

    pub fn feed(&mut self, eaten: f64, params: &SpeciesParams) {
        self.weight += eaten * params.beta;
    }

    pub fn lose_annual_weight(&mut self, params: &SpeciesParams) {
        self.weight -= self.weight * params.eta;
    }

    pub fn age_one_year(&mut self) {
        self.age += 1;
    }

    pub fn procreation_probability(&self, params: &SpeciesParams, population: usize) -> f64 {
        if population < 2 || self.weight < params.birth_weight_threshold() {
            return 0.0;
        }
        let p = params.gamma * self.fitness(params) * (population - 1) as f64;
        p.min(1.0)
    }

    /// Normal draw around `w_birth`; non-positive draws are redrawn.
    pub fn birth_weight_sample<R: Rng>(params: &SpeciesParams, rng: &mut R) -> f64 {
        for _ in 0..BIRTH_WEIGHT_DRAWS {
            let weight = rng.gaussian(params.w_birth, params.sigma_birth);
            if weight > 0.0 {
                return weight;
            }
        }
        MIN_BIRTH_WEIGHT
    }

    /// Roll for a birth against a population of `population` same-species
    /// residents. The mother pays `xi` times the newborn's weight; a birth she
    /// cannot afford does not happen.
    pub fn give_birth<R: Rng>(
        &mut self,
        params: &SpeciesParams,
        population: usize,
        rng: &mut R,
    ) -> Option<Animal> {
        let probability = self.procreation_probability(params, population);
        if !rng.chance(probability) {
            return None;
        }
        let newborn_weight = Self::birth_weight_sample(params, rng);
        let cost = params.xi * newborn_weight;
        if self.weight - cost <= 0.0 {
            return None;
        }
        self.weight -= cost;
        Some(Animal::new(self.species, 0, newborn_weight))
    }

    pub fn death_probability(&self, params: &SpeciesParams) -> f64 {
        if self.weight <= 0.0 {
            return 1.0;
        }
        params.omega * (1.0 - self.fitness(params))
    }

    pub fn movement_probability(&self, params: &SpeciesParams) -> f64 {
        params.mu * self.fitness(params)
    }
}

/// Chance that a predator of fitness `predator` kills prey of fitness `prey`.
pub fn kill_probability(predator: f64, prey: f64, params: &SpeciesParams) -> f64 {
    if predator <= prey {
        return 0.0;
    }
    (params.kill_scale * (predator - prey) / params.delta_phi_max).min(1.0)
}
