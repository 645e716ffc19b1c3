use std::marker::PhantomData;

use crate::cartesian::Point2d;
use crate::geo::GeoPoint2d;

/// Conversion of points between two coordinate spaces.
///
/// Both directions return `None` if a point cannot be converted. A projection may return non-finite coordinates
/// for points outside of its domain (e.g. poles in Mercator); callers are expected to validate the output.
pub trait Projection {
    /// Type of the input points.
    type InPoint;
    /// Type of the output points.
    type OutPoint;

    /// Converts a point from the input space into the output one.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;
    /// Converts a point from the output space back into the input one.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}

/// Projection that returns its input unchanged.
#[derive(Debug, Default)]
pub struct IdentityProjection<P> {
    phantom: PhantomData<P>,
}

impl<P> IdentityProjection<P> {
    /// Creates a new instance.
    pub fn new() -> Self {
        Self {
            phantom: PhantomData,
        }
    }
}

impl<P: Copy> Projection for IdentityProjection<P> {
    type InPoint = P;
    type OutPoint = P;

    fn project(&self, input: &P) -> Option<P> {
        Some(*input)
    }

    fn unproject(&self, input: &P) -> Option<P> {
        Some(*input)
    }
}

/// Coordinates of a geographic CRS: `x` is the longitude and `y` is the latitude, both in degrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeographicProjection;

impl Projection for GeographicProjection {
    type InPoint = GeoPoint2d;
    type OutPoint = Point2d;

    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        Some(Point2d::new(input.lon(), input.lat()))
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        Some(GeoPoint2d::latlon(input.y, input.x))
    }
}

/// Projection that swaps the directions of the inner one.
pub struct InvertedProjection<In, Out> {
    inner: Box<dyn Projection<InPoint = Out, OutPoint = In>>,
}

impl<In, Out> InvertedProjection<In, Out> {
    /// Creates a new instance.
    pub fn new(inner: Box<dyn Projection<InPoint = Out, OutPoint = In>>) -> Self {
        Self { inner }
    }
}

impl<In, Out> Projection for InvertedProjection<In, Out> {
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &In) -> Option<Out> {
        self.inner.unproject(input)
    }

    fn unproject(&self, input: &Out) -> Option<In> {
        self.inner.project(input)
    }
}

/// Applies two projections one after another.
pub struct ChainProjection<In, Mid, Out> {
    first: Box<dyn Projection<InPoint = In, OutPoint = Mid>>,
    second: Box<dyn Projection<InPoint = Mid, OutPoint = Out>>,
}

impl<In, Mid, Out> ChainProjection<In, Mid, Out> {
    /// Creates a new instance.
    pub fn new(
        first: Box<dyn Projection<InPoint = In, OutPoint = Mid>>,
        second: Box<dyn Projection<InPoint = Mid, OutPoint = Out>>,
    ) -> Self {
        Self { first, second }
    }
}

impl<In, Mid, Out> Projection for ChainProjection<In, Mid, Out> {
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &In) -> Option<Out> {
        self.second.project(&self.first.project(input)?)
    }

    fn unproject(&self, input: &Out) -> Option<In> {
        self.first.unproject(&self.second.unproject(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geographic_axis_order() {
        let projected = GeographicProjection
            .project(&GeoPoint2d::latlon(52.0, 10.0))
            .expect("projects");
        assert_eq!(projected, Point2d::new(10.0, 52.0));
        assert_eq!(
            GeographicProjection.unproject(&projected),
            Some(GeoPoint2d::latlon(52.0, 10.0))
        );
    }

    #[test]
    fn chain_of_inverted_is_identity() {
        let inverted: InvertedProjection<Point2d, GeoPoint2d> =
            InvertedProjection::new(Box::new(GeographicProjection));
        let chain: ChainProjection<Point2d, GeoPoint2d, Point2d> =
            ChainProjection::new(Box::new(inverted), Box::new(GeographicProjection));

        let point = Point2d::new(-73.5, 45.25);
        assert_eq!(chain.project(&point), Some(point));
        assert_eq!(chain.unproject(&point), Some(point));
    }
}
