//! Conversion of [`geojson`] geometries into [`Geom`].

use geojson::{LineStringType, PolygonType, Position, Value};

use crate::cartesian::Point2d;
use crate::error::MeridianTypesError;
use crate::geometry::{Contour, Geom, MultiContour, MultiPolygon, Polygon};

fn to_point(position: &Position) -> Result<Point2d, MeridianTypesError> {
    match position.as_slice() {
        [x, y, ..] => Ok(Point2d::new(*x, *y)),
        _ => Err(MeridianTypesError::Conversion(format!(
            "position must have at least 2 coordinates, got {}",
            position.len()
        ))),
    }
}

fn to_points(line: &LineStringType) -> Result<Vec<Point2d>, MeridianTypesError> {
    line.iter().map(to_point).collect()
}

fn to_polygon(rings: &PolygonType) -> Result<Polygon, MeridianTypesError> {
    let mut rings = rings.iter();
    let outer = rings
        .next()
        .ok_or_else(|| MeridianTypesError::Conversion("polygon without rings".into()))?;
    let inner = rings.map(to_points).collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(to_points(outer)?, inner))
}

impl TryFrom<&Value> for Geom {
    type Error = MeridianTypesError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::LineString(line) => Ok(Contour::open(to_points(line)?).into()),
            Value::MultiLineString(lines) => Ok(MultiContour {
                parts: lines
                    .iter()
                    .map(|line| to_points(line).map(Contour::open))
                    .collect::<Result<_, _>>()?,
            }
            .into()),
            Value::Polygon(rings) => Ok(to_polygon(rings)?.into()),
            Value::MultiPolygon(polygons) => Ok(MultiPolygon {
                parts: polygons.iter().map(to_polygon).collect::<Result<_, _>>()?,
            }
            .into()),
            Value::Point(_) | Value::MultiPoint(_) => Err(MeridianTypesError::Conversion(
                "point geometries are loaded as markers".into(),
            )),
            Value::GeometryCollection(_) => Err(MeridianTypesError::Conversion(
                "geometry collections are not supported".into(),
            )),
        }
    }
}

impl TryFrom<geojson::Geometry> for Geom {
    type Error = MeridianTypesError;

    fn try_from(geometry: geojson::Geometry) -> Result<Self, Self::Error> {
        Geom::try_from(&geometry.value)
    }
}

/// Extracts point coordinates from a `Point` or `MultiPoint` geometry.
pub fn points_from_value(value: &Value) -> Result<Vec<Point2d>, MeridianTypesError> {
    match value {
        Value::Point(position) => Ok(vec![to_point(position)?]),
        Value::MultiPoint(positions) => positions.iter().map(to_point).collect(),
        _ => Err(MeridianTypesError::Conversion(
            "only point geometries can be used as markers".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn polygon_with_hole() {
        let value = Value::Polygon(vec![
            vec![
                vec![0.0, 0.0],
                vec![10.0, 0.0],
                vec![10.0, 10.0],
                vec![0.0, 10.0],
                vec![0.0, 0.0],
            ],
            vec![
                vec![2.0, 2.0],
                vec![4.0, 2.0],
                vec![4.0, 4.0],
                vec![2.0, 2.0],
            ],
        ]);

        let geom = Geom::try_from(&value).expect("converts");
        let polygons = geom.polygons();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].outer_contour.points().len(), 4);
        assert_eq!(polygons[0].inner_contours.len(), 1);
    }

    #[test]
    fn multi_line() {
        let value = Value::MultiLineString(vec![
            vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            vec![vec![2.0, 2.0], vec![3.0, 3.0, 100.0]],
        ]);
        let geom = Geom::try_from(&value).expect("converts");
        assert_eq!(geom.lines().len(), 2);
        assert!(geom.is_lineal());
    }

    #[test]
    fn invalid_inputs() {
        assert_matches!(
            Geom::try_from(&Value::LineString(vec![vec![0.0]])),
            Err(MeridianTypesError::Conversion(_))
        );
        assert_matches!(
            Geom::try_from(&Value::Point(vec![0.0, 1.0])),
            Err(MeridianTypesError::Conversion(_))
        );
        assert_eq!(
            points_from_value(&Value::MultiPoint(vec![vec![1.0, 2.0], vec![3.0, 4.0]]))
                .expect("converts"),
            vec![Point2d::new(1.0, 2.0), Point2d::new(3.0, 4.0)]
        );
    }
}
