use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    config::{LoggingConfig, ReportConfig},
    error::SimResult,
    island::Coord,
    world::{SeedRecord, World},
};

fn default_years() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub years: Option<u64>,
    /// Rows of terrain letters, bordered by `X`.
    pub island: String,
    #[serde(default)]
    pub species: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub landscapes: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub population: Vec<PopulationGroup>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopulationGroup {
    pub loc: (usize, usize),
    pub pop: Vec<AnimalSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimalSeed {
    pub species: String,
    pub age: u32,
    pub weight: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn seed_records(&self) -> Vec<SeedRecord> {
        self.population
            .iter()
            .flat_map(|group| {
                let coord = Coord::from(group.loc);
                group.pop.iter().map(move |seed| SeedRecord {
                    coord,
                    species: seed.species.clone(),
                    age: seed.age,
                    weight: seed.weight,
                })
            })
            .collect()
    }

    /// Build the world: island first, then landscape and species overrides,
    /// then the initial population.
    pub fn build_world(&self) -> SimResult<World> {
        let mut world = World::new(&self.island)?;
        for (terrain, overrides) in &self.landscapes {
            world.set_landscape_parameters(terrain, overrides.iter().map(|(k, v)| (k, *v)))?;
        }
        for (species, overrides) in &self.species {
            world.set_species_parameters(species, overrides.iter().map(|(k, v)| (k, *v)))?;
        }
        world.add_population(&self.seed_records())?;
        Ok(world)
    }

    pub fn years(&self, override_years: Option<u64>) -> u64 {
        override_years.or(self.years).unwrap_or_else(default_years)
    }
}
