//! Error types.

use crate::optics::Phase;

/// Possible cloud optics errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudOpticsError {
    /// A lookup table has fewer than two points along the size axis
    TooFewSizeSteps {
        /// Phase the table belongs to
        phase: Phase,
        /// Number of size points found
        nsteps: usize,
    },
    /// The size bounds don't give a positive, finite step size
    InvalidStepSize {
        /// Phase the table belongs to
        phase: Phase,
    },
    /// The extinction, albedo, and asymmetry tables of a phase differ in shape
    TableShapeMismatch {
        /// Phase the tables belong to
        phase: Phase,
    },
    /// A lookup table's band dimension disagrees with the band set
    BandMismatch {
        /// Phase the table belongs to
        phase: Phase,
        /// Number of bands in the band set
        expected: usize,
        /// Number of bands in the table
        actual: usize,
    },
    /// The ice tables don't have the roughness category used for ice
    MissingRoughness {
        /// Number of roughness categories in the tables
        available: usize,
    },
    /// The band limits are empty, not finite, or have an upper limit below
    /// the lower limit
    InvalidBandLimits,
    /// An input doesn't have the expected shape
    InconsistentInputs {
        /// Name of the offending input
        field: &'static str,
    },
    /// An optical property is outside of its physical range
    OutOfRange {
        /// Name of the offending property
        field: &'static str,
    },
}

impl std::fmt::Display for CloudOpticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudOpticsError::TooFewSizeSteps { phase, nsteps } => {
                write!(
                    f,
                    "{phase} lookup table needs at least 2 size points, got {nsteps}"
                )
            }
            CloudOpticsError::InvalidStepSize { phase } => {
                write!(f, "{phase} size bounds give a non-positive step size")
            }
            CloudOpticsError::TableShapeMismatch { phase } => {
                write!(f, "{phase} lookup tables don't share the same shape")
            }
            CloudOpticsError::BandMismatch {
                phase,
                expected,
                actual,
            } => write!(
                f,
                "{phase} lookup table has {actual} bands but the band set has {expected}"
            ),
            CloudOpticsError::MissingRoughness { available } => write!(
                f,
                "ice lookup tables have {available} roughness categories, need at least 2"
            ),
            CloudOpticsError::InvalidBandLimits => write!(f, "invalid band limits"),
            CloudOpticsError::InconsistentInputs { field } => {
                write!(f, "input `{field}` has the wrong shape")
            }
            CloudOpticsError::OutOfRange { field } => {
                write!(f, "`{field}` is outside of its valid range")
            }
        }
    }
}

impl std::error::Error for CloudOpticsError {}
