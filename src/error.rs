use std::time::Duration;

use thiserror::Error;

use crate::simulation_engine::intersections::IntersectionId;
use crate::simulation_engine::vehicles::VehicleId;

/// A bounded passage request gave up before being granted.
///
/// This is the crate's only recoverable runtime error in the control path;
/// everything else in the admission protocol either succeeds or is a fatal
/// contract violation that panics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("vehicle {vehicle} timed out after {timeout:?} waiting for passage at intersection {intersection}")]
pub struct PassageTimeout {
    pub vehicle: VehicleId,
    pub intersection: IntersectionId,
    pub timeout: Duration,
}

/// Errors from command-line configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown city map '{0}' (expected 'paris' or 'nyc')")]
    UnknownCity(String),
    #[error("invalid value '{value}' for {flag}")]
    InvalidFlag { flag: &'static str, value: String },
    #[error("{flag} requires a value")]
    MissingValue { flag: String },
    #[error("unrecognized argument '{0}'")]
    UnknownFlag(String),
}
