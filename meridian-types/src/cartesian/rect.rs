use serde::{Deserialize, Serialize};

use crate::cartesian::Point2d;
use crate::segment::Segment;

/// Axis-aligned rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x coordinate.
    pub x_min: f64,
    /// Minimum y coordinate.
    pub y_min: f64,
    /// Maximum x coordinate.
    pub x_max: f64,
    /// Maximum y coordinate.
    pub y_max: f64,
}

impl Rect {
    /// Creates a new rectangle from its boundaries. The caller is responsible for `min <= max`.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a rectangle spanning two arbitrary corners.
    pub fn from_corners(a: Point2d, b: Point2d) -> Self {
        Self {
            x_min: a.x.min(b.x),
            y_min: a.y.min(b.y),
            x_max: a.x.max(b.x),
            y_max: a.y.max(b.y),
        }
    }

    /// Creates a square with the given center and half side length.
    pub fn around(center: Point2d, half_size: f64) -> Self {
        Self::new(
            center.x - half_size,
            center.y - half_size,
            center.x + half_size,
            center.y + half_size,
        )
    }

    /// Minimal rectangle containing all the given points. Returns `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2d>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for p in points {
            rect.x_min = rect.x_min.min(p.x);
            rect.y_min = rect.y_min.min(p.y);
            rect.x_max = rect.x_max.max(p.x);
            rect.y_max = rect.y_max.max(p.y);
        }

        Some(rect)
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Returns a copy of the rectangle grown on every side by `fraction` of the corresponding span.
    ///
    /// With `fraction = 0.001` a rectangle of width 100 gets 0.1 added both on the left and on the right.
    pub fn expand_by_fraction(&self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            x_min: self.x_min - dx,
            y_min: self.y_min - dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
        }
    }

    /// Returns true if the point lies inside or on the border of the rectangle.
    pub fn contains(&self, point: &Point2d) -> bool {
        self.x_min <= point.x
            && self.x_max >= point.x
            && self.y_min <= point.y
            && self.y_max >= point.y
    }

    /// Returns true if the rectangles have at least one common point.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Returns true if the segment has at least one common point with the rectangle (including its inner area).
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        if self.contains(segment.0) || self.contains(segment.1) {
            return true;
        }

        let corners = self.into_quadrangle();
        (0..4).any(|i| {
            let side = Segment(&corners[i], &corners[(i + 1) % 4]);
            side.intersects(segment)
        })
    }

    /// Corners of the rectangle in counterclockwise order starting from the bottom left one.
    pub fn into_quadrangle(self) -> [Point2d; 4] {
        [
            Point2d::new(self.x_min, self.y_min),
            Point2d::new(self.x_max, self.y_min),
            Point2d::new(self.x_max, self.y_max),
            Point2d::new(self.x_min, self.y_max),
        ]
    }
}

impl FromIterator<Rect> for Option<Rect> {
    fn from_iter<T: IntoIterator<Item = Rect>>(iter: T) -> Self {
        iter.into_iter().reduce(|acc, rect| acc.merge(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_and_expand() {
        let points = [
            Point2d::new(0.0, 10.0),
            Point2d::new(100.0, -10.0),
            Point2d::new(50.0, 0.0),
        ];
        let rect = Rect::from_points(&points).expect("non-empty");
        assert_eq!(rect, Rect::new(0.0, -10.0, 100.0, 10.0));

        let expanded = rect.expand_by_fraction(0.001);
        approx::assert_abs_diff_eq!(expanded.x_min, -0.1);
        approx::assert_abs_diff_eq!(expanded.x_max, 100.1);
        approx::assert_abs_diff_eq!(expanded.y_min, -10.02);
        approx::assert_abs_diff_eq!(expanded.y_max, 10.02);

        assert!(Rect::from_points(&[]).is_none());
    }

    #[test]
    fn merge_collect() {
        let merged: Option<Rect> = [Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(-1.0, 0.5, 0.5, 3.0)]
            .into_iter()
            .collect();
        assert_eq!(merged, Some(Rect::new(-1.0, 0.0, 1.0, 3.0)));

        let empty: Option<Rect> = std::iter::empty().collect();
        assert_eq!(empty, None);
    }

    #[test]
    fn segment_intersection() {
        let rect = Rect::from_corners(Point2d::new(2.0, 2.0), Point2d::new(0.0, 0.0));

        let (a, b) = (Point2d::new(-1.0, 1.0), Point2d::new(3.0, 1.0));
        assert!(rect.intersects_segment(&Segment(&a, &b)));

        let (a, b) = (Point2d::new(0.5, 0.5), Point2d::new(0.6, 0.6));
        assert!(rect.intersects_segment(&Segment(&a, &b)));

        let (a, b) = (Point2d::new(-1.0, 3.0), Point2d::new(3.0, 3.0));
        assert!(!rect.intersects_segment(&Segment(&a, &b)));
    }
}
