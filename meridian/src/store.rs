//! Dataset features and markers of a session, and their views in the target CRS.

use meridian_types::cartesian::is_valid_coordinate;
use meridian_types::geo::Crs;
use meridian_types::{Contour, Point2d, Polygon};

use crate::error::MeridianError;
use crate::feature::Feature;
use crate::transform::CrsTransformService;

/// Minimum number of valid vertices in a polygon ring.
pub const MIN_RING_VERTICES: usize = 3;
/// Minimum number of valid vertices in a line.
pub const MIN_LINE_VERTICES: usize = 2;

/// Polygon in the target CRS together with the index of the feature it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedPolygon {
    /// Index of the feature in the dataset.
    pub feature_index: usize,
    /// Polygon in the target CRS.
    pub polygon: Polygon,
}

/// Line in the target CRS together with the index of the feature it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedLine {
    /// Index of the feature in the dataset.
    pub feature_index: usize,
    /// Line in the target CRS.
    pub line: Contour,
}

/// Marker position in the target CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedMarker {
    /// Index of the marker in ingestion order.
    pub marker_index: usize,
    /// Position in the target CRS.
    pub position: Point2d,
}

/// Counters of data lost while producing a transformed view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformReport {
    /// Geometries (or markers) that could not be transformed at all.
    pub skipped_geometries: usize,
    /// Polygon parts, holes or lines left with too few valid vertices.
    pub skipped_parts: usize,
    /// Vertices with non-finite coordinates after transformation.
    pub dropped_vertices: usize,
}

impl TransformReport {
    /// Returns true if nothing was lost.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Adds the counters of another report.
    pub fn merge(&mut self, other: TransformReport) {
        self.skipped_geometries += other.skipped_geometries;
        self.skipped_parts += other.skipped_parts;
        self.dropped_vertices += other.dropped_vertices;
    }
}

/// Owner of the dataset features and markers of a session.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    features: Vec<Feature>,
    source_crs: Crs,
    markers: Vec<Point2d>,
    marker_crs: Crs,
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            source_crs: Crs::WGS84,
            markers: Vec::new(),
            marker_crs: Crs::WGS84,
        }
    }
}

impl FeatureStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the features of the store.
    ///
    /// All attribute records must have the same set of fields. If they don't, the store is not changed.
    pub fn load(&mut self, features: Vec<Feature>, source_crs: Crs) -> Result<(), MeridianError> {
        if let Some(first) = features.first() {
            let fields = first.attributes().field_set();
            if let Some((index, _)) = features
                .iter()
                .enumerate()
                .find(|(_, f)| f.attributes().field_set() != fields)
            {
                return Err(MeridianError::Dataset(format!(
                    "attribute fields of feature {index} differ from the fields of feature 0"
                )));
            }
        }

        log::info!("Loaded {} features in {source_crs}", features.len());
        self.features = features;
        self.source_crs = source_crs;
        Ok(())
    }

    /// Replaces the markers of the store.
    pub fn load_markers(&mut self, markers: Vec<Point2d>, crs: Crs) {
        log::info!("Loaded {} markers in {crs}", markers.len());
        self.markers = markers;
        self.marker_crs = crs;
    }

    /// Removes all features and markers. Both CRSs return to WGS 84, the CRS of data loaded without a projection
    /// file.
    pub fn clear(&mut self) {
        self.features.clear();
        self.markers.clear();
        self.source_crs = Crs::WGS84;
        self.marker_crs = Crs::WGS84;
    }

    /// Removes markers with the given ingestion indices. Unknown indices are ignored. Returns the number of removed
    /// markers.
    pub fn remove_markers(&mut self, indices: &[usize]) -> usize {
        let before = self.markers.len();
        let mut index = 0;
        self.markers.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });

        before - self.markers.len()
    }

    /// Features in ingestion order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Markers in ingestion order, in the marker CRS.
    pub fn markers(&self) -> &[Point2d] {
        &self.markers
    }

    /// CRS of the features.
    pub fn source_crs(&self) -> &Crs {
        &self.source_crs
    }

    /// CRS of the markers.
    pub fn marker_crs(&self) -> &Crs {
        &self.marker_crs
    }

    /// Returns true if there are neither features nor markers.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.markers.is_empty()
    }

    /// Polygon parts of all areal features in the target CRS. A multi-polygon produces one entry per part.
    pub fn transformed_polygons(
        &self,
        transform: &CrsTransformService,
    ) -> Result<(Vec<TransformedPolygon>, TransformReport), MeridianError> {
        transform.active()?;

        let mut report = TransformReport::default();
        let mut polygons = vec![];
        for (feature_index, feature) in self.features.iter().enumerate() {
            if !feature.geometry().is_areal() {
                continue;
            }

            let projected = match transform.transform_geometry(feature.geometry(), feature_index) {
                Ok(projected) => projected,
                Err(err) => {
                    log::warn!("{err}, skipping");
                    report.skipped_geometries += 1;
                    continue;
                }
            };

            for polygon in projected.polygons() {
                let Some(outer) = valid_ring(&polygon.outer_contour, &mut report) else {
                    log::warn!("Polygon of feature {feature_index} has too few valid vertices, skipping");
                    report.skipped_parts += 1;
                    continue;
                };

                let mut inner = vec![];
                for hole in &polygon.inner_contours {
                    match valid_ring(hole, &mut report) {
                        Some(hole) => inner.push(hole),
                        None => {
                            log::warn!("Hole of feature {feature_index} has too few valid vertices, dropping it");
                            report.skipped_parts += 1;
                        }
                    }
                }

                polygons.push(TransformedPolygon {
                    feature_index,
                    polygon: Polygon::new(outer, inner),
                });
            }
        }

        Ok((polygons, report))
    }

    /// Line parts of all lineal features in the target CRS. A multi-line produces one entry per part.
    pub fn transformed_lines(
        &self,
        transform: &CrsTransformService,
    ) -> Result<(Vec<TransformedLine>, TransformReport), MeridianError> {
        transform.active()?;

        let mut report = TransformReport::default();
        let mut lines = vec![];
        for (feature_index, feature) in self.features.iter().enumerate() {
            if !feature.geometry().is_lineal() {
                continue;
            }

            let projected = match transform.transform_geometry(feature.geometry(), feature_index) {
                Ok(projected) => projected,
                Err(err) => {
                    log::warn!("{err}, skipping");
                    report.skipped_geometries += 1;
                    continue;
                }
            };

            for line in projected.lines() {
                let points = valid_points(line.points(), &mut report);
                if points.len() < MIN_LINE_VERTICES {
                    log::warn!("Line of feature {feature_index} has too few valid vertices, skipping");
                    report.skipped_parts += 1;
                    continue;
                }

                lines.push(TransformedLine {
                    feature_index,
                    line: Contour::open(points),
                });
            }
        }

        Ok((lines, report))
    }

    /// Markers in the target CRS. Markers that cannot be transformed are skipped.
    pub fn transformed_markers(
        &self,
        transform: &CrsTransformService,
    ) -> Result<(Vec<TransformedMarker>, TransformReport), MeridianError> {
        let marker_transform = transform.transform_from(&self.marker_crs)?;

        let mut report = TransformReport::default();
        let mut markers = Vec::with_capacity(self.markers.len());
        for (marker_index, marker) in self.markers.iter().enumerate() {
            match marker_transform.apply(marker) {
                Some(position) if is_valid_coordinate(&position) => markers.push(TransformedMarker {
                    marker_index,
                    position,
                }),
                Some(position) => {
                    let err = MeridianError::InvalidCoordinate {
                        x: position.x,
                        y: position.y,
                    };
                    log::warn!("Marker {marker_index}: {err}, skipping");
                    report.dropped_vertices += 1;
                }
                None => {
                    log::warn!("Marker {marker_index} cannot be transformed, skipping");
                    report.skipped_geometries += 1;
                }
            }
        }

        Ok((markers, report))
    }
}

fn valid_points(points: &[Point2d], report: &mut TransformReport) -> Vec<Point2d> {
    let valid: Vec<Point2d> = points
        .iter()
        .copied()
        .filter(is_valid_coordinate)
        .collect();
    let dropped = points.len() - valid.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} vertices with invalid coordinates");
        report.dropped_vertices += dropped;
    }

    valid
}

fn valid_ring(ring: &Contour, report: &mut TransformReport) -> Option<Vec<Point2d>> {
    let points = valid_points(ring.points(), report);
    (points.len() >= MIN_RING_VERTICES).then_some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeValue, Attributes};
    use assert_matches::assert_matches;
    use meridian_types::{Geom, MultiPolygon};

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2d> {
        vec![
            Point2d::new(x, y),
            Point2d::new(x + size, y),
            Point2d::new(x + size, y + size),
            Point2d::new(x, y + size),
        ]
    }

    fn identity() -> CrsTransformService {
        let mut service = CrsTransformService::new();
        service.set_projection("EPSG:4326", "EPSG:4326").expect("valid");
        service
    }

    #[test]
    fn load_validates_fields() {
        let mut store = FeatureStore::new();
        store
            .load(
                vec![Feature::new(
                    Polygon::new(square(0.0, 0.0, 1.0), vec![]),
                    Attributes::new().with("name", "A"),
                )],
                Crs::WGS84,
            )
            .expect("valid");

        let result = store.load(
            vec![
                Feature::new(
                    Polygon::new(square(0.0, 0.0, 1.0), vec![]),
                    Attributes::new().with("name", "B").with("code", 1),
                ),
                Feature::new(
                    Polygon::new(square(2.0, 0.0, 1.0), vec![]),
                    Attributes::new().with("code", 2),
                ),
            ],
            Crs::WGS84,
        );

        assert_matches!(result, Err(MeridianError::Dataset(_)));
        assert_eq!(store.features().len(), 1);
        assert_eq!(
            store.features()[0].attributes().get("name"),
            Some(&AttributeValue::from("A"))
        );
    }

    #[test]
    fn multi_polygon_keeps_feature_index() {
        let mut store = FeatureStore::new();
        store
            .load(
                vec![
                    Feature::from_geometry(Contour::open(square(0.0, 0.0, 1.0))),
                    Feature::from_geometry(MultiPolygon {
                        parts: vec![
                            Polygon::new(square(0.0, 0.0, 1.0), vec![]),
                            Polygon::new(square(5.0, 5.0, 1.0), vec![]),
                        ],
                    }),
                ],
                Crs::WGS84,
            )
            .expect("valid");

        let (polygons, report) = store.transformed_polygons(&identity()).expect("transforms");
        assert!(report.is_clean());
        assert_eq!(polygons.len(), 2);
        assert!(polygons.iter().all(|p| p.feature_index == 1));

        let (lines, _) = store.transformed_lines(&identity()).expect("transforms");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].feature_index, 0);
    }

    #[test]
    fn invalid_vertices_are_dropped() {
        let mut store = FeatureStore::new();
        let mut outer = square(0.0, 0.0, 10.0);
        outer.push(Point2d::new(f64::NAN, 1.0));
        let hole = vec![
            Point2d::new(1.0, 1.0),
            Point2d::new(f64::INFINITY, 1.0),
            Point2d::new(2.0, 2.0),
        ];
        store
            .load(
                vec![
                    Feature::from_geometry(Polygon::new(outer, vec![hole])),
                    Feature::from_geometry(Polygon::new(
                        vec![
                            Point2d::new(0.0, 0.0),
                            Point2d::new(f64::NAN, 0.0),
                            Point2d::new(1.0, 1.0),
                        ],
                        vec![],
                    )),
                    Feature::from_geometry(Contour::open(vec![
                        Point2d::new(0.0, 0.0),
                        Point2d::new(f64::NAN, f64::NAN),
                    ])),
                ],
                Crs::WGS84,
            )
            .expect("valid");

        let (polygons, report) = store.transformed_polygons(&identity()).expect("transforms");
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].polygon.outer_contour.points().len(), 4);
        assert!(polygons[0].polygon.inner_contours.is_empty());
        assert_eq!(report.dropped_vertices, 3);
        assert_eq!(report.skipped_parts, 2);

        let (lines, report) = store.transformed_lines(&identity()).expect("transforms");
        assert!(lines.is_empty());
        assert_eq!(report.skipped_parts, 1);
    }

    #[test]
    fn views_require_projection() {
        let store = FeatureStore::new();
        let service = CrsTransformService::new();
        assert_matches!(store.transformed_polygons(&service), Err(MeridianError::Projection(_)));
        assert_matches!(store.transformed_markers(&service), Err(MeridianError::Projection(_)));
    }

    #[test]
    fn markers_in_own_crs() {
        let mut store = FeatureStore::new();
        store.load_markers(
            vec![Point2d::new(4_321_000.0, 3_210_000.0), Point2d::new(f64::NAN, 0.0)],
            Crs::parse("EPSG:3035").expect("known"),
        );

        let (markers, report) = store.transformed_markers(&identity()).expect("transforms");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].marker_index, 0);
        approx::assert_relative_eq!(markers[0].position.x, 10.0, epsilon = 1e-6);
        approx::assert_relative_eq!(markers[0].position.y, 52.0, epsilon = 1e-6);
        assert!(!report.is_clean());
    }

    #[test]
    fn remove_and_clear() {
        let mut store = FeatureStore::new();
        store.load_markers(
            (0..5).map(|i| Point2d::new(i as f64, 0.0)).collect(),
            Crs::WGS84,
        );
        assert_eq!(store.remove_markers(&[1, 3, 10]), 2);
        assert_eq!(
            store.markers(),
            &[Point2d::new(0.0, 0.0), Point2d::new(2.0, 0.0), Point2d::new(4.0, 0.0)]
        );

        store
            .load(
                vec![Feature::from_geometry(Geom::from(Contour::open(vec![])))],
                Crs::WGS84,
            )
            .expect("valid");
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn clear_resets_crs() {
        let mut store = FeatureStore::new();
        let laea = Crs::parse("EPSG:3035").expect("known");
        store
            .load(
                vec![Feature::from_geometry(Polygon::new(square(0.0, 0.0, 1.0), vec![]))],
                laea.clone(),
            )
            .expect("valid");
        store.load_markers(vec![Point2d::new(1.0, 1.0)], laea);

        store.clear();
        assert_eq!(store.source_crs(), &Crs::WGS84);
        assert_eq!(store.marker_crs(), &Crs::WGS84);
    }
}
