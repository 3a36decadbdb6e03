pub mod animal;
pub mod cell;
pub mod config;
pub mod engine;
pub mod error;
pub mod island;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod species;
pub mod systems;
pub mod terrain;
pub mod world;

pub use engine::{Engine, YearPhase, YearSummary};
pub use error::{SimError, SimResult};
pub use island::Coord;
pub use scenario::Scenario;
pub use species::Species;
pub use terrain::Terrain;
pub use world::{SeedRecord, World, YearReport};
