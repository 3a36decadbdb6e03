//! Terrain types and the landscape constant tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Jungle,
    Savannah,
    Desert,
    Mountain,
    Ocean,
    OutOfBounds,
}

impl Terrain {
    pub const ALL: [Terrain; 6] = [
        Terrain::Jungle,
        Terrain::Savannah,
        Terrain::Desert,
        Terrain::Mountain,
        Terrain::Ocean,
        Terrain::OutOfBounds,
    ];

    pub fn from_letter(letter: char) -> Option<Self> {
        Terrain::ALL.into_iter().find(|t| t.letter() == letter)
    }

    pub fn letter(self) -> char {
        match self {
            Terrain::Jungle => 'J',
            Terrain::Savannah => 'S',
            Terrain::Desert => 'D',
            Terrain::Mountain => 'M',
            Terrain::Ocean => 'O',
            Terrain::OutOfBounds => 'X',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Terrain::Jungle => "Jungle",
            Terrain::Savannah => "Savannah",
            Terrain::Desert => "Desert",
            Terrain::Mountain => "Mountain",
            Terrain::Ocean => "Ocean",
            Terrain::OutOfBounds => "OutOfBounds",
        }
    }

    /// Whether animals may live in (or pass through) a cell of this terrain.
    pub fn is_habitable(self) -> bool {
        !matches!(self, Terrain::Ocean | Terrain::OutOfBounds)
    }

    pub fn grows_fodder(self) -> bool {
        matches!(self, Terrain::Jungle | Terrain::Savannah)
    }

    fn parse_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let mut chars = tag.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            return Terrain::from_letter(letter.to_ascii_uppercase());
        }
        Terrain::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandscapeParams {
    /// Maximum fodder the cell can hold.
    pub f_max: f64,
    /// Savannah regrowth rate toward `f_max`.
    pub alpha: f64,
}

impl LandscapeParams {
    pub fn defaults_for(terrain: Terrain) -> Self {
        match terrain {
            Terrain::Jungle => Self {
                f_max: 800.0,
                alpha: 0.0,
            },
            Terrain::Savannah => Self {
                f_max: 300.0,
                alpha: 0.3,
            },
            _ => Self {
                f_max: 0.0,
                alpha: 0.0,
            },
        }
    }

    /// Fodder available after this year's regrowth.
    pub fn regrow(&self, terrain: Terrain, fodder: f64) -> f64 {
        match terrain {
            Terrain::Jungle => self.f_max,
            Terrain::Savannah => (fodder + self.alpha * (self.f_max - fodder)).clamp(0.0, self.f_max),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeRegistry {
    tables: BTreeMap<Terrain, LandscapeParams>,
}

impl Default for LandscapeRegistry {
    fn default() -> Self {
        let tables = Terrain::ALL
            .into_iter()
            .map(|terrain| (terrain, LandscapeParams::defaults_for(terrain)))
            .collect();
        Self { tables }
    }
}

impl LandscapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, terrain: Terrain) -> &LandscapeParams {
        &self.tables[&terrain]
    }

    /// Override landscape constants for the terrain named by letter or name.
    /// Only Jungle (`f_max`) and Savannah (`f_max`, `alpha`) are tunable.
    pub fn set<K, I>(&mut self, tag: &str, overrides: I) -> SimResult<Terrain>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let terrain = Terrain::parse_tag(tag).ok_or_else(|| SimError::UnknownParameter {
            subject: "landscape".into(),
            key: tag.to_string(),
        })?;
        let mut merged = *self.get(terrain);
        for (key, value) in overrides {
            let key = key.as_ref();
            let slot = match (terrain, key) {
                (Terrain::Jungle | Terrain::Savannah, "f_max") => &mut merged.f_max,
                (Terrain::Savannah, "alpha") => &mut merged.alpha,
                _ => {
                    return Err(SimError::UnknownParameter {
                        subject: terrain.name().into(),
                        key: key.to_string(),
                    })
                }
            };
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::validation(
                    terrain.name(),
                    key,
                    value,
                    "value must be finite and non-negative",
                ));
            }
            if key == "alpha" && value > 1.0 {
                return Err(SimError::validation(
                    terrain.name(),
                    key,
                    value,
                    "value must lie in [0, 1]",
                ));
            }
            *slot = value;
        }
        self.tables.insert(terrain, merged);
        Ok(terrain)
    }
}
