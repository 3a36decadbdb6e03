use thiserror::Error;

use crate::island::Coord;

/// Structural failures raised while building or configuring a world.
///
/// Nothing in here is produced once a year is being simulated; the yearly
/// formulas are clamped analytically and treat violations as defects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("invalid value {value} for '{key}' of {subject}: {reason}")]
    Validation {
        subject: String,
        key: String,
        value: f64,
        reason: String,
    },

    #[error("unknown parameter '{key}' for {subject}")]
    UnknownParameter { subject: String, key: String },

    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("cannot place {species} on {terrain} cell at {coord}")]
    Placement {
        species: String,
        terrain: String,
        coord: Coord,
    },

    #[error("coordinate {coord} is outside the {rows}x{cols} island")]
    Bounds { coord: Coord, rows: usize, cols: usize },

    #[error("invalid argument: {0}")]
    Argument(String),
}

impl SimError {
    pub(crate) fn validation(
        subject: impl Into<String>,
        key: &str,
        value: f64,
        reason: &str,
    ) -> Self {
        SimError::Validation {
            subject: subject.into(),
            key: key.to_string(),
            value,
            reason: reason.to_string(),
        }
    }

    /// True for both out-of-range values and unrecognised keys.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SimError::Validation { .. } | SimError::UnknownParameter { .. }
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
