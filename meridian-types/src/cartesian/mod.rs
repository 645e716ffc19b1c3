//! Planar (cartesian) coordinates: points, rectangles and orientation of point triplets.

mod orient;
mod rect;

pub use orient::Orientation;
pub use rect::Rect;

/// 2d point with `f64` coordinates.
pub type Point2d = nalgebra::Point2<f64>;

/// 2d vector with `f64` coordinates.
pub type Vector2d = nalgebra::Vector2<f64>;

/// Returns true if both coordinates of the point are finite numbers.
pub fn is_valid_coordinate(point: &Point2d) -> bool {
    point.x.is_finite() && point.y.is_finite()
}
