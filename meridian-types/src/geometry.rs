//! Vector geometries of a dataset: lines ([`Contour`]), polygons and their multi-part versions.
//!
//! A [`Contour`] is a sequence of points that can be open (a road, a river) or closed (a ring of a polygon). Closed
//! contours never repeat the first point at the end: the closing segment is implied. Rings coming from formats that
//! duplicate the first point (shapefiles, GeoJSON) are normalized by [`Contour::closed`].

use serde::{Deserialize, Serialize};

use crate::cartesian::{Point2d, Rect};
use crate::geo::Projection;
use crate::segment::Segment;

/// Sequence of points. See module level documentation for details.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point2d>,
    is_closed: bool,
}

impl Contour {
    /// Creates an open contour (a line).
    pub fn open(points: Vec<Point2d>) -> Self {
        Self {
            points,
            is_closed: false,
        }
    }

    /// Creates a closed contour (a ring). If the last point repeats the first one, it is removed.
    pub fn closed(mut points: Vec<Point2d>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        Self {
            points,
            is_closed: true,
        }
    }

    /// Whether the contour is closed.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Points of the contour. For closed contours the first point is not repeated at the end.
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// Consumes the contour returning its points.
    pub fn into_points(self) -> Vec<Point2d> {
        self.points
    }

    /// Iterates over segments of the contour. For closed contours this includes the segment between the last and the
    /// first points.
    pub fn iter_segments(&self) -> impl Iterator<Item = Segment<'_>> {
        let count = self.points.len();
        let segment_count = match (self.is_closed, count) {
            (_, 0 | 1) => 0,
            (true, _) => count,
            (false, _) => count - 1,
        };

        (0..segment_count).map(move |i| Segment(&self.points[i], &self.points[(i + 1) % count]))
    }

    /// Minimal rectangle containing all the points of the contour.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(&self.points)
    }

    /// Area of the ring formed by the points (shoelace formula), treating the contour as closed. Positive for
    /// counter-clockwise rings, negative for clockwise ones.
    pub fn signed_area(&self) -> f64 {
        let count = self.points.len();
        if count < 3 {
            return 0.0;
        }

        let doubled: f64 = (0..count)
            .map(|i| {
                let p = &self.points[i];
                let q = &self.points[(i + 1) % count];
                p.x * q.y - q.x * p.y
            })
            .sum();
        doubled / 2.0
    }

    /// Returns true if the point is inside the area bounded by the (closed) contour or on one of its sides.
    ///
    /// Uses the winding number of the contour around the point, so self-intersecting rings are treated with the
    /// non-zero rule.
    pub fn contains_point(&self, point: &Point2d) -> bool {
        let mut winding = 0i64;
        let count = self.points.len();
        if count < 3 {
            return false;
        }

        for i in 0..count {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % count];

            if Segment(a, b).distance_to_point_sq(point) == 0.0 {
                return true;
            }

            let cross = (b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y);
            if a.y <= point.y {
                if b.y > point.y && cross > 0.0 {
                    winding += 1;
                }
            } else if b.y <= point.y && cross < 0.0 {
                winding -= 1;
            }
        }

        winding != 0
    }

    /// Returns true if any segment of the contour or any of its vertices touches the rectangle. For closed contours the
    /// inner area is also considered.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        if self.points.iter().any(|p| rect.contains(p)) {
            return true;
        }

        if self.iter_segments().any(|s| rect.intersects_segment(&s)) {
            return true;
        }

        self.is_closed && self.contains_point(&rect.center())
    }

    /// Projects all the points of the contour. Returns `None` if any of the points cannot be projected.
    pub fn project<P>(&self, projection: &P) -> Option<Contour>
    where
        P: Projection<InPoint = Point2d, OutPoint = Point2d> + ?Sized,
    {
        Some(Self {
            points: self
                .points
                .iter()
                .map(|p| projection.project(p))
                .collect::<Option<Vec<_>>>()?,
            is_closed: self.is_closed,
        })
    }
}

/// Polygon with an outer ring and any number of holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Outer ring of the polygon.
    pub outer_contour: Contour,
    /// Holes of the polygon.
    pub inner_contours: Vec<Contour>,
}

impl Polygon {
    /// Creates a new polygon. All the given contours are treated as closed.
    pub fn new(outer: Vec<Point2d>, inner: Vec<Vec<Point2d>>) -> Self {
        Self {
            outer_contour: Contour::closed(outer),
            inner_contours: inner.into_iter().map(Contour::closed).collect(),
        }
    }

    /// Iterates over all rings of the polygon, starting with the outer one.
    pub fn iter_contours(&self) -> impl Iterator<Item = &Contour> {
        std::iter::once(&self.outer_contour).chain(self.inner_contours.iter())
    }

    /// Returns true if the point lies inside the outer ring (or on its border) and not strictly inside any hole.
    pub fn contains_point(&self, point: &Point2d) -> bool {
        self.outer_contour.contains_point(point)
            && !self.inner_contours.iter().any(|hole| {
                hole.contains_point(point)
                    && !hole
                        .iter_segments()
                        .any(|s| s.distance_to_point_sq(point) == 0.0)
            })
    }

    /// Minimal rectangle containing the outer ring.
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.outer_contour.bounding_rect()
    }

    /// Projects all the rings of the polygon.
    pub fn project<P>(&self, projection: &P) -> Option<Polygon>
    where
        P: Projection<InPoint = Point2d, OutPoint = Point2d> + ?Sized,
    {
        Some(Self {
            outer_contour: self.outer_contour.project(projection)?,
            inner_contours: self
                .inner_contours
                .iter()
                .map(|c| c.project(projection))
                .collect::<Option<Vec<_>>>()?,
        })
    }
}

/// Set of polygons belonging to the same feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPolygon {
    /// Polygons.
    pub parts: Vec<Polygon>,
}

/// Set of lines belonging to the same feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiContour {
    /// Lines.
    pub parts: Vec<Contour>,
}

/// Kind of a geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    /// Single line.
    Contour,
    /// Several lines.
    MultiContour,
    /// Single polygon.
    Polygon,
    /// Several polygons.
    MultiPolygon,
}

/// Geometry of a dataset feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geom {
    /// Line geometry.
    Contour(Contour),
    /// Multi-line geometry.
    MultiContour(MultiContour),
    /// Polygon geometry.
    Polygon(Polygon),
    /// Multi-polygon geometry.
    MultiPolygon(MultiPolygon),
}

impl Geom {
    /// Kind of the geometry.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geom::Contour(_) => GeometryType::Contour,
            Geom::MultiContour(_) => GeometryType::MultiContour,
            Geom::Polygon(_) => GeometryType::Polygon,
            Geom::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// Returns true for polygons and multi-polygons.
    pub fn is_areal(&self) -> bool {
        matches!(self, Geom::Polygon(_) | Geom::MultiPolygon(_))
    }

    /// Returns true for lines and multi-lines.
    pub fn is_lineal(&self) -> bool {
        matches!(self, Geom::Contour(_) | Geom::MultiContour(_))
    }

    /// Polygon parts of the geometry. Empty for lineal geometries.
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geom::Polygon(polygon) => std::slice::from_ref(polygon),
            Geom::MultiPolygon(multi) => &multi.parts,
            _ => &[],
        }
    }

    /// Line parts of the geometry. Empty for areal geometries.
    pub fn lines(&self) -> &[Contour] {
        match self {
            Geom::Contour(contour) => std::slice::from_ref(contour),
            Geom::MultiContour(multi) => &multi.parts,
            _ => &[],
        }
    }

    /// Total number of vertices in all parts and rings.
    pub fn vertex_count(&self) -> usize {
        let rings: usize = self
            .polygons()
            .iter()
            .flat_map(|p| p.iter_contours())
            .map(|c| c.points().len())
            .sum();
        let lines: usize = self.lines().iter().map(|c| c.points().len()).sum();
        rings + lines
    }

    /// Projects every vertex of every part. A single failing vertex fails the whole geometry.
    pub fn project<P>(&self, projection: &P) -> Option<Geom>
    where
        P: Projection<InPoint = Point2d, OutPoint = Point2d> + ?Sized,
    {
        Some(match self {
            Geom::Contour(contour) => Geom::Contour(contour.project(projection)?),
            Geom::MultiContour(multi) => Geom::MultiContour(MultiContour {
                parts: multi
                    .parts
                    .iter()
                    .map(|c| c.project(projection))
                    .collect::<Option<Vec<_>>>()?,
            }),
            Geom::Polygon(polygon) => Geom::Polygon(polygon.project(projection)?),
            Geom::MultiPolygon(multi) => Geom::MultiPolygon(MultiPolygon {
                parts: multi
                    .parts
                    .iter()
                    .map(|p| p.project(projection))
                    .collect::<Option<Vec<_>>>()?,
            }),
        })
    }
}

impl From<Contour> for Geom {
    fn from(value: Contour) -> Self {
        Self::Contour(value)
    }
}

impl From<Polygon> for Geom {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}

impl From<MultiPolygon> for Geom {
    fn from(value: MultiPolygon) -> Self {
        Self::MultiPolygon(value)
    }
}

impl From<MultiContour> for Geom {
    fn from(value: MultiContour) -> Self {
        Self::MultiContour(value)
    }
}
