//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeridianTypesError {
    /// The CRS identifier cannot be resolved into a known coordinate reference system.
    #[error("unknown coordinate reference system: {0}")]
    UnknownCrs(String),
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
}
