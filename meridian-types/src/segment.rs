//! Straight line segments.

use crate::cartesian::{Orientation, Point2d};

/// A straight line segment between two points.
#[derive(Debug, PartialEq)]
pub struct Segment<'a>(pub &'a Point2d, pub &'a Point2d);

impl Segment<'_> {
    /// Shortest euclidean distance (squared) between a point and the segment:
    ///
    /// * if the normal from the point to the segment ends inside the segment, the returned value is the squared length
    ///   of the normal
    /// * if the normal from the point to the segment ends outside of the segment, the returned value is the smaller one
    ///   of the distances between the point and the segment's endpoints
    pub fn distance_to_point_sq(&self, point: &Point2d) -> f64 {
        if self.0 == self.1 {
            return (point - self.0).norm_squared();
        }

        let ds = self.1 - self.0;
        let dp = point - self.0;
        let ds_len = ds.norm_squared();

        let r = dp.dot(&ds) / ds_len;
        if r <= 0.0 {
            (point - self.0).norm_squared()
        } else if r >= 1.0 {
            (point - self.1).norm_squared()
        } else {
            let s = (dp.y * ds.x - dp.x * ds.y) / ds_len;
            (s * s) * ds_len
        }
    }

    /// Returns true, if the segment has at least one common point with the `other` segment.
    pub fn intersects(&self, other: &Segment) -> bool {
        let o1 = Orientation::triplet(self.0, self.1, other.0);
        let o2 = Orientation::triplet(self.0, self.1, other.1);
        let o3 = Orientation::triplet(other.0, other.1, self.0);
        let o4 = Orientation::triplet(other.0, other.1, self.1);

        if o1 != o2
            && o3 != o4
            && o1 != Orientation::Collinear
            && o2 != Orientation::Collinear
            && o3 != Orientation::Collinear
            && o4 != Orientation::Collinear
        {
            return true;
        }

        (o1 == Orientation::Collinear && on_segment(self.0, other.0, self.1))
            || (o2 == Orientation::Collinear && on_segment(self.0, other.1, self.1))
            || (o3 == Orientation::Collinear && on_segment(other.0, self.0, other.1))
            || (o4 == Orientation::Collinear && on_segment(other.0, self.1, other.1))
    }
}

/// Checks if `q` lies within the bounding box of the `p`-`r` segment. Only meaningful for collinear points.
fn on_segment(p: &Point2d, q: &Point2d, r: &Point2d) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}
