use std::sync::Arc;

use meridian_types::cartesian::Rect;
use meridian_types::geo::ExtentKind;
use meridian_types::{Geom, Polygon};

use super::{LayerKind, Paint, Primitive, PrimitiveKind, Scene, SceneStyle, Shape};
use crate::attributes::Attributes;
use crate::error::MeridianError;
use crate::store::{FeatureStore, TransformReport, TransformedMarker};
use crate::transform::{compute_extent, CrsTransformService};

/// Rings whose area is below this share of their bounding box area are treated as having no area.
const DEGENERATE_AREA_RATIO: f64 = 1e-12;

/// Summary of a scene rebuild.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RebuildReport {
    /// Number of fill polygons added.
    pub polygons: usize,
    /// Number of line paths added.
    pub lines: usize,
    /// Number of marker icons added.
    pub markers: usize,
    /// Primitives skipped as degenerate.
    pub skipped_primitives: usize,
    /// Data lost while transforming the dataset.
    pub transform: TransformReport,
    /// Data extent in the target CRS, including the buffer.
    pub extent: Option<Rect>,
}

impl Scene {
    /// Rebuilds all layers from the store.
    ///
    /// Fails only if there is no active projection, in which case the scene is not changed. Features and markers that
    /// cannot be transformed are skipped and counted in the report.
    pub fn rebuild_all(
        &mut self,
        store: &FeatureStore,
        transform: &CrsTransformService,
        style: &SceneStyle,
    ) -> Result<RebuildReport, MeridianError> {
        let (polygons, polygon_report) = store.transformed_polygons(transform)?;
        let (lines, line_report) = store.transformed_lines(transform)?;
        let (markers, marker_report) = store.transformed_markers(transform)?;

        self.clear_all();

        let mut report = RebuildReport::default();
        report.transform.merge(polygon_report);
        report.transform.merge(line_report);
        report.transform.merge(marker_report);

        let geometries: Vec<Geom> = polygons
            .iter()
            .map(|p| Geom::Polygon(p.polygon.clone()))
            .chain(lines.iter().map(|l| Geom::Contour(l.line.clone())))
            .collect();
        report.extent = compute_extent(&geometries);

        if let Some(extent) = report.extent {
            let extent_shape = extent_shape(&extent, transform.extent_kind());
            self.layer_mut(LayerKind::Background).push(Primitive::new(
                PrimitiveKind::Background,
                extent_shape.clone(),
                Paint::fill(style.background),
            ));
            self.layer_mut(LayerKind::Frame).push(Primitive::new(
                PrimitiveKind::BoundaryPath,
                extent_shape,
                Paint::stroke(style.frame_stroke),
            ));
        }

        let empty = Arc::new(Attributes::new());
        for transformed in polygons {
            if is_degenerate(&transformed.polygon) {
                log::warn!(
                    "Polygon of feature {} has zero area, skipping",
                    transformed.feature_index
                );
                report.skipped_primitives += 1;
                continue;
            }

            let attributes = store
                .features()
                .get(transformed.feature_index)
                .map(|f| f.attributes().clone())
                .unwrap_or_else(|| empty.clone());

            self.layer_mut(LayerKind::Boundaries).push(
                Primitive::new(
                    PrimitiveKind::BoundaryPath,
                    Shape::Polygon(transformed.polygon.clone()),
                    Paint::stroke(style.boundary_stroke),
                )
                .with_source(transformed.feature_index),
            );
            self.layer_mut(LayerKind::FillPolygons).push(
                Primitive::new(
                    PrimitiveKind::FillPolygon,
                    Shape::Polygon(transformed.polygon),
                    style.polygon_paint(),
                )
                .with_source(transformed.feature_index)
                .with_attributes(attributes),
            );
            report.polygons += 1;
        }

        for transformed in lines {
            self.layer_mut(LayerKind::Lines).push(
                Primitive::new(
                    PrimitiveKind::LinePath,
                    Shape::Path(transformed.line),
                    Paint::stroke(style.line_stroke),
                )
                .with_source(transformed.feature_index),
            );
            report.lines += 1;
        }

        report.markers = self.push_markers(markers, style, &mut report.skipped_primitives);

        log::info!(
            "Scene rebuilt: {} polygons, {} lines, {} markers, {} skipped",
            report.polygons,
            report.lines,
            report.markers,
            report.skipped_primitives
        );
        if !report.transform.is_clean() {
            log::warn!("Data lost during transformation: {:?}", report.transform);
        }

        Ok(report)
    }

    /// Rebuilds only the marker layer, keeping all other layers untouched.
    pub fn rebuild_markers_only(
        &mut self,
        store: &FeatureStore,
        transform: &CrsTransformService,
        style: &SceneStyle,
    ) -> Result<RebuildReport, MeridianError> {
        let (markers, marker_report) = store.transformed_markers(transform)?;

        self.layer_mut(LayerKind::Markers).clear();

        let mut report = RebuildReport {
            transform: marker_report,
            ..Default::default()
        };
        report.markers = self.push_markers(markers, style, &mut report.skipped_primitives);
        log::debug!("Marker layer rebuilt: {} markers", report.markers);

        Ok(report)
    }

    fn push_markers(
        &mut self,
        markers: Vec<TransformedMarker>,
        style: &SceneStyle,
        skipped: &mut usize,
    ) -> usize {
        let diameter = style.marker_diameter();
        if !(diameter.is_finite() && diameter > 0.0) {
            if !markers.is_empty() {
                log::warn!("Marker size {diameter} is not positive, markers are not drawn");
                *skipped += markers.len();
            }
            return 0;
        }

        let layer = self.layer_mut(LayerKind::Markers);
        for marker in &markers {
            layer.push(
                Primitive::new(
                    PrimitiveKind::MarkerIcon,
                    Shape::Marker {
                        position: marker.position,
                        diameter,
                    },
                    Paint::fill(style.marker_color),
                )
                .with_source(marker.marker_index),
            );
        }

        markers.len()
    }
}

/// Background shape of the extent: the rectangle itself, or a disk centered on the extent with the radius of half
/// its smaller side.
fn extent_shape(extent: &Rect, kind: ExtentKind) -> Shape {
    match kind {
        ExtentKind::Circular => Shape::Disk {
            center: extent.center(),
            radius: extent.width().min(extent.height()) / 2.0,
        },
        ExtentKind::Rectangular => {
            Shape::Polygon(Polygon::new(extent.into_quadrangle().to_vec(), vec![]))
        }
    }
}

/// Exterior ring encloses no area. Collinear rings that are not axis-aligned still have a non-empty bounding box,
/// so the ring area is compared relative to the box.
fn is_degenerate(polygon: &Polygon) -> bool {
    let Some(rect) = polygon.bounding_rect() else {
        return true;
    };

    let area = polygon.outer_contour.signed_area().abs();
    !area.is_finite() || area <= rect.area() * DEGENERATE_AREA_RATIO
}
