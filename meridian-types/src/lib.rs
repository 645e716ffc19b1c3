//! Geometry and coordinate system types used by the `meridian` scene engine.
//!
//! The crate is split in two halves:
//!
//! * [`cartesian`] and [`geometry`] contain planar geometries ([`Contour`], [`Polygon`] and their multi-part
//!   versions) together with the few algorithms the engine needs for hit-testing: point-in-polygon,
//!   segment intersection and bounding rectangles.
//! * [`geo`] contains geographic points, the registry of supported coordinate reference systems ([`geo::Crs`])
//!   and the [`geo::Projection`] trait that converts coordinates between them.
//!
//! All geometries store their coordinates as [`Point2d`] in the units of the CRS they were created in. For
//! geographic CRSs this means `x` is the longitude and `y` is the latitude in degrees.

pub mod cartesian;
pub mod error;
pub mod geo;
pub mod geometry;
pub mod segment;

#[cfg(feature = "geojson")]
pub mod geojson;

pub use cartesian::{Point2d, Rect};
pub use geometry::{Contour, Geom, GeometryType, MultiContour, MultiPolygon, Polygon};
