//! Species tags and the per-species constant tables.
//!
//! Behaviour never dispatches on the species itself; every formula reads the
//! resolved [`SpeciesParams`], so a new species is a new table entry.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Herbivore,
    Carnivore,
}

/// What a species eats, and therefore which feeding phase it takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diet {
    Fodder,
    Prey,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Herbivore, Species::Carnivore];

    pub fn name(self) -> &'static str {
        match self {
            Species::Herbivore => "Herbivore",
            Species::Carnivore => "Carnivore",
        }
    }

    pub fn diet(self) -> Diet {
        match self {
            Species::Herbivore => Diet::Fodder,
            Species::Carnivore => Diet::Prey,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = SimError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Species::ALL
            .into_iter()
            .find(|species| species.name().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| SimError::UnknownSpecies(tag.to_string()))
    }
}

/// Constant table for one species. Keys in overrides use the column names
/// shown in [`SpeciesParams::KEYS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Mean birth weight.
    pub w_birth: f64,
    /// Standard deviation of birth weight.
    pub sigma_birth: f64,
    /// Fraction of eaten biomass converted into body weight.
    pub beta: f64,
    /// Fraction of body weight lost every year.
    pub eta: f64,
    pub a_half: f64,
    pub phi_age: f64,
    pub w_half: f64,
    pub phi_weight: f64,
    /// Movement probability scale.
    pub mu: f64,
    /// Sensitivity of migration to relative food abundance.
    pub lambda: f64,
    pub gamma: f64,
    /// Birth weight threshold factor.
    pub zeta: f64,
    /// Weight the mother loses per unit of newborn weight.
    pub xi: f64,
    pub omega: f64,
    /// Appetite, the most food eaten in one year.
    pub appetite: f64,
    pub kill_scale: f64,
    pub delta_phi_max: f64,
}

#[derive(Clone, Copy)]
enum Range {
    NonNegative,
    UnitInterval,
    Positive,
    Finite,
}

impl Range {
    fn check(self, value: f64) -> Result<(), &'static str> {
        if !value.is_finite() {
            return Err("value must be finite");
        }
        match self {
            Range::NonNegative if value < 0.0 => Err("value must be non-negative"),
            Range::UnitInterval if !(0.0..=1.0).contains(&value) => {
                Err("value must lie in [0, 1]")
            }
            Range::Positive if value <= 0.0 => Err("value must be strictly positive"),
            _ => Ok(()),
        }
    }
}

impl SpeciesParams {
    pub const KEYS: [&'static str; 17] = [
        "w_birth",
        "sigma_birth",
        "beta",
        "eta",
        "a_half",
        "phi_age",
        "w_half",
        "phi_weight",
        "mu",
        "lambda",
        "gamma",
        "zeta",
        "xi",
        "omega",
        "F",
        "kill_scale",
        "DeltaPhiMax",
    ];

    pub fn herbivore() -> Self {
        Self {
            w_birth: 8.0,
            sigma_birth: 1.5,
            beta: 0.9,
            eta: 0.05,
            a_half: 40.0,
            phi_age: 0.2,
            w_half: 10.0,
            phi_weight: 0.1,
            mu: 0.25,
            lambda: 1.0,
            gamma: 0.2,
            zeta: 3.5,
            xi: 1.2,
            omega: 0.4,
            appetite: 10.0,
            kill_scale: 1.0,
            delta_phi_max: 10.0,
        }
    }

    pub fn carnivore() -> Self {
        Self {
            w_birth: 6.0,
            sigma_birth: 1.0,
            beta: 0.75,
            eta: 0.125,
            a_half: 60.0,
            phi_age: 0.4,
            w_half: 4.0,
            phi_weight: 0.4,
            mu: 0.4,
            lambda: 1.0,
            gamma: 0.8,
            zeta: 3.5,
            xi: 1.1,
            omega: 0.9,
            appetite: 50.0,
            kill_scale: 1.0,
            delta_phi_max: 10.0,
        }
    }

    pub fn defaults_for(species: Species) -> Self {
        match species {
            Species::Herbivore => Self::herbivore(),
            Species::Carnivore => Self::carnivore(),
        }
    }

    /// Minimum weight an animal needs before it can give birth.
    pub fn birth_weight_threshold(&self) -> f64 {
        self.zeta * (self.w_birth + self.sigma_birth)
    }

    fn slot(&mut self, key: &str) -> Option<(&mut f64, Range)> {
        let slot = match key {
            "w_birth" => (&mut self.w_birth, Range::NonNegative),
            "sigma_birth" => (&mut self.sigma_birth, Range::NonNegative),
            "beta" => (&mut self.beta, Range::UnitInterval),
            "eta" => (&mut self.eta, Range::UnitInterval),
            "a_half" => (&mut self.a_half, Range::NonNegative),
            "phi_age" => (&mut self.phi_age, Range::NonNegative),
            "w_half" => (&mut self.w_half, Range::NonNegative),
            "phi_weight" => (&mut self.phi_weight, Range::NonNegative),
            "mu" => (&mut self.mu, Range::UnitInterval),
            "lambda" => (&mut self.lambda, Range::Finite),
            "gamma" => (&mut self.gamma, Range::NonNegative),
            "zeta" => (&mut self.zeta, Range::NonNegative),
            "xi" => (&mut self.xi, Range::NonNegative),
            "omega" => (&mut self.omega, Range::UnitInterval),
            "F" => (&mut self.appetite, Range::NonNegative),
            "kill_scale" => (&mut self.kill_scale, Range::NonNegative),
            "DeltaPhiMax" => (&mut self.delta_phi_max, Range::Positive),
            _ => return None,
        };
        Some(slot)
    }

    /// Apply overrides to a copy, returning it only if every value is legal.
    pub fn with_overrides<K, I>(&self, subject: &str, overrides: I) -> SimResult<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut merged = self.clone();
        for (key, value) in overrides {
            let key = key.as_ref();
            let (slot, range) = merged
                .slot(key)
                .ok_or_else(|| SimError::UnknownParameter {
                    subject: subject.to_string(),
                    key: key.to_string(),
                })?;
            range
                .check(value)
                .map_err(|reason| SimError::validation(subject, key, value, reason))?;
            *slot = value;
        }
        Ok(merged)
    }
}

/// Resolved parameter tables for every registered species.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRegistry {
    tables: BTreeMap<Species, SpeciesParams>,
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        let tables = Species::ALL
            .into_iter()
            .map(|species| (species, SpeciesParams::defaults_for(species)))
            .collect();
        Self { tables }
    }
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `overrides` onto the current table of the species named `tag`.
    /// Either every override is applied or none is.
    pub fn set<K, I>(&mut self, tag: &str, overrides: I) -> SimResult<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let species: Species = tag.parse()?;
        let merged = self.get(species).with_overrides(species.name(), overrides)?;
        self.tables.insert(species, merged);
        Ok(())
    }

    pub fn get(&self, species: Species) -> &SpeciesParams {
        // Every variant is inserted by `Default`, and `set` only replaces entries.
        &self.tables[&species]
    }

    pub fn lookup(&self, tag: &str) -> SimResult<&SpeciesParams> {
        let species: Species = tag.parse()?;
        Ok(self.get(species))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_species_tags_case_insensitively() {
        assert_eq!("Herbivore".parse::<Species>(), Ok(Species::Herbivore));
        assert_eq!("carnivore".parse::<Species>(), Ok(Species::Carnivore));
        assert_eq!(
            "Omnivore".parse::<Species>(),
            Err(SimError::UnknownSpecies("Omnivore".into()))
        );
    }

    #[test]
    fn set_merges_onto_defaults() {
        let mut registry = SpeciesRegistry::new();
        registry
            .set("Carnivore", [("eta", 0.2), ("DeltaPhiMax", 5.0)])
            .unwrap();

        let carnivore = registry.get(Species::Carnivore);
        assert_eq!(carnivore.eta, 0.2);
        assert_eq!(carnivore.delta_phi_max, 5.0);
        assert_eq!(carnivore.appetite, 50.0);
        assert_eq!(registry.get(Species::Herbivore), &SpeciesParams::herbivore());
    }

    #[test]
    fn rejected_override_leaves_table_untouched() {
        let mut registry = SpeciesRegistry::new();
        let err = registry
            .set("Herbivore", [("gamma", 0.5), ("beta", 1.5)])
            .unwrap_err();

        match err {
            SimError::Validation { key, value, .. } => {
                assert_eq!(key, "beta");
                assert_eq!(value, 1.5);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(registry.get(Species::Herbivore).gamma, 0.2);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut registry = SpeciesRegistry::new();
        for (key, value) in [
            ("w_birth", -1.0),
            ("eta", 1.01),
            ("mu", -0.1),
            ("omega", 2.0),
            ("DeltaPhiMax", 0.0),
            ("F", f64::NAN),
            ("lambda", f64::INFINITY),
        ] {
            let err = registry.set("Herbivore", [(key, value)]).unwrap_err();
            assert!(err.is_validation(), "{key}={value} should be rejected");
        }
    }

    #[test]
    fn lambda_may_be_negative() {
        let mut registry = SpeciesRegistry::new();
        registry.set("Herbivore", [("lambda", -1.0)]).unwrap();
        assert_eq!(registry.get(Species::Herbivore).lambda, -1.0);
    }

    #[test]
    fn unknown_keys_and_species_fail() {
        let mut registry = SpeciesRegistry::new();
        assert_eq!(
            registry.set("Herbivore", [("wings", 2.0)]),
            Err(SimError::UnknownParameter {
                subject: "Herbivore".into(),
                key: "wings".into()
            })
        );
        assert_eq!(
            registry.set("Dragon", [("eta", 0.1)]),
            Err(SimError::UnknownSpecies("Dragon".into()))
        );
    }

    #[test]
    fn every_listed_key_is_settable() {
        let base = SpeciesParams::herbivore();
        for key in SpeciesParams::KEYS {
            assert!(base.with_overrides("Herbivore", [(key, 0.5)]).is_ok(), "{key}");
        }
    }
}
