//! Dataset feature type.

use std::sync::Arc;

use meridian_types::Geom;

use crate::attributes::Attributes;

/// Dataset feature: a geometry and its attribute record.
///
/// The record is shared with every scene primitive built from the feature, so the attribute table and the
/// picked primitives always show the same values.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    geometry: Geom,
    attributes: Arc<Attributes>,
}

impl Feature {
    /// Creates a new feature.
    pub fn new(geometry: impl Into<Geom>, attributes: Attributes) -> Self {
        Self {
            geometry: geometry.into(),
            attributes: Arc::new(attributes),
        }
    }

    /// Creates a feature without attributes.
    pub fn from_geometry(geometry: impl Into<Geom>) -> Self {
        Self::new(geometry, Attributes::new())
    }

    /// Geometry of the feature in the source CRS of the dataset.
    pub fn geometry(&self) -> &Geom {
        &self.geometry
    }

    /// Attribute record of the feature.
    pub fn attributes(&self) -> &Arc<Attributes> {
        &self.attributes
    }
}
