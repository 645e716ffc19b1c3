//! Error types used by the crate.

use meridian_types::error::MeridianTypesError;
use thiserror::Error;

/// Meridian error type.
#[derive(Debug, Error)]
pub enum MeridianError {
    /// A CRS identifier cannot be resolved or no transformation is configured yet.
    #[error("projection error: {0}")]
    Projection(String),
    /// A geometry cannot be transformed into the target CRS.
    #[error("failed to transform geometry of feature {feature_index}")]
    GeometryTransform {
        /// Index of the feature in the dataset.
        feature_index: usize,
    },
    /// A transformed coordinate is not a finite number.
    #[error("invalid coordinate ({x}, {y})")]
    InvalidCoordinate {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
    /// There is nothing to render.
    #[error("scene is empty")]
    EmptyScene,
    /// Rendering or encoding of the output image failed.
    #[error("render error: {0}")]
    Render(String),
    /// Input dataset is inconsistent.
    #[error("invalid dataset: {0}")]
    Dataset(String),
    /// Error writing data to the FS.
    #[error("failed to write file")]
    Io(#[from] std::io::Error),
}

impl From<MeridianTypesError> for MeridianError {
    fn from(value: MeridianTypesError) -> Self {
        match value {
            MeridianTypesError::UnknownCrs(_) => Self::Projection(value.to_string()),
            MeridianTypesError::Conversion(_) => Self::Dataset(value.to_string()),
        }
    }
}

impl From<image::ImageError> for MeridianError {
    fn from(value: image::ImageError) -> Self {
        Self::Render(value.to_string())
    }
}
