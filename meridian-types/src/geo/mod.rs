//! Geographic coordinates (latitude and longitude) (see [`GeoPoint2d`]), coordinate reference systems ([`Crs`])
//! and conversion between them (see [`Projection`]).

mod crs;
#[cfg(feature = "geodesy")]
mod geodesy;
mod point;
mod projection;

pub use crs::{classify_extent, Crs, CrsKind, ExtentKind, CIRCULAR_CRS};
#[cfg(feature = "geodesy")]
pub use geodesy::GeodesyProjection;
pub use point::GeoPoint2d;
pub use projection::{
    ChainProjection, GeographicProjection, IdentityProjection, InvertedProjection, Projection,
};
