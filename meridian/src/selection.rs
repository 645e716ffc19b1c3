//! Point and region picking, and the highlight set.

use std::sync::Arc;

use meridian_types::{Point2d, Rect};

use crate::attributes::Attributes;
use crate::messenger::AttributeSink;
use crate::scene::{HighlightKind, PrimitiveId, PrimitiveKind, Scene, SceneStyle};

/// Interaction mode of the pick tool. The modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickMode {
    /// Picks are ignored.
    #[default]
    None,
    /// A click selects the top-most polygon under the cursor.
    Point,
    /// A dragged rectangle selects every selectable primitive it touches.
    Region,
}

/// Returns the top-most fill polygon containing the point. Points on the polygon border are inside.
pub fn hit_test_point(scene: &Scene, point: &Point2d) -> Option<PrimitiveId> {
    scene
        .iter_top_down()
        .find(|(_, primitive)| {
            primitive.kind() == PrimitiveKind::FillPolygon && primitive.shape().contains_point(point)
        })
        .map(|(id, _)| id)
}

/// Returns all selectable primitives touching the rectangle, in draw order.
pub fn hit_test_region(scene: &Scene, rect: &Rect) -> Vec<PrimitiveId> {
    scene
        .iter_draw_order()
        .filter(|(_, primitive)| {
            primitive.kind().is_selectable() && primitive.shape().intersects_rect(rect)
        })
        .map(|(id, _)| id)
        .collect()
}

/// Ordered set of highlighted primitives.
///
/// Every primitive in the set has its original paint saved in its style state, so [`HighlightEngine::clear_highlights`]
/// can restore all of them.
#[derive(Debug, Default, Clone)]
pub struct HighlightEngine {
    highlighted: Vec<PrimitiveId>,
}

impl HighlightEngine {
    /// Creates an engine with an empty highlight set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently highlighted primitives in the order they were highlighted.
    pub fn highlighted(&self) -> &[PrimitiveId] {
        &self.highlighted
    }

    /// Returns true if the primitive is highlighted.
    pub fn is_highlighted(&self, id: PrimitiveId) -> bool {
        self.highlighted.contains(&id)
    }

    /// Highlights a primitive. Returns false if it is already highlighted or does not exist.
    pub fn highlight(
        &mut self,
        scene: &mut Scene,
        id: PrimitiveId,
        style: &SceneStyle,
        kind: HighlightKind,
    ) -> bool {
        if self.is_highlighted(id) {
            return false;
        }

        let Some(primitive) = scene.primitive_mut(id) else {
            log::debug!("Cannot highlight {id:?}: no such primitive");
            return false;
        };

        let paint = style.highlight_paint(primitive.paint(), kind);
        primitive.apply_highlight(paint, kind);
        self.highlighted.push(id);
        true
    }

    /// Restores the original paint of every highlighted primitive and empties the set.
    pub fn clear_highlights(&mut self, scene: &mut Scene) {
        for id in self.highlighted.drain(..) {
            if let Some(primitive) = scene.primitive_mut(id) {
                primitive.restore();
            }
        }
    }

    /// Forgets the whole set without touching the scene. Used after the scene is rebuilt.
    pub fn forget(&mut self) {
        self.highlighted.clear();
    }

    /// Forgets the ids of primitives of one layer. Used after that layer is rebuilt.
    pub fn forget_layer(&mut self, layer: crate::scene::LayerKind) {
        self.highlighted.retain(|id| id.layer != layer);
    }

    /// Clears the previous selection and highlights the top-most polygon containing the point.
    ///
    /// The sink receives the attribute record of the picked polygon, or `None` if nothing was hit.
    pub fn pick_point(
        &mut self,
        scene: &mut Scene,
        point: &Point2d,
        style: &SceneStyle,
        sink: &dyn AttributeSink,
    ) -> Option<PrimitiveId> {
        self.clear_highlights(scene);

        let picked = hit_test_point(scene, point);
        match picked {
            Some(id) => {
                self.highlight(scene, id, style, HighlightKind::Pick);
                let record = scene.primitive(id).and_then(|p| p.attributes());
                log::debug!("Picked {id:?} at ({}, {})", point.x, point.y);
                sink.show_attributes(record.map(|r| r.as_ref()));
            }
            None => sink.show_attributes(None),
        }

        picked
    }

    /// Clears the previous selection and highlights every selectable primitive touching the rectangle spanned by two
    /// corners given in any order.
    ///
    /// If anything is selected, the sink receives the attribute records of the selected polygons as a table, and the
    /// first of them as the displayed record. An empty selection is not reported.
    pub fn pick_region(
        &mut self,
        scene: &mut Scene,
        corner_a: Point2d,
        corner_b: Point2d,
        style: &SceneStyle,
        sink: &dyn AttributeSink,
    ) -> Vec<PrimitiveId> {
        self.clear_highlights(scene);

        let rect = Rect::from_corners(corner_a, corner_b);
        let selected = hit_test_region(scene, &rect);
        if selected.is_empty() {
            log::debug!("Region pick selected nothing");
            return selected;
        }

        for id in &selected {
            self.highlight(scene, *id, style, HighlightKind::Pick);
        }

        let records = records_of(scene, &selected);
        log::debug!(
            "Region pick selected {} primitives, {} records",
            selected.len(),
            records.len()
        );
        sink.show_table(&records);
        sink.show_attributes(records.first().map(|r| r.as_ref()));

        selected
    }
}

/// Attribute records of the given primitives. Primitives without a record are skipped.
pub fn records_of(scene: &Scene, ids: &[PrimitiveId]) -> Vec<Arc<Attributes>> {
    ids.iter()
        .filter_map(|id| scene.primitive(*id))
        .filter_map(|p| p.attributes().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::messenger::recording::{Notification, RecordingSink};
    use crate::scene::{LayerKind, StyleState};
    use crate::store::FeatureStore;
    use crate::transform::CrsTransformService;
    use assert_matches::assert_matches;
    use meridian_types::geo::Crs;
    use meridian_types::{Contour, Polygon};

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2d> {
        vec![
            Point2d::new(x, y),
            Point2d::new(x + size, y),
            Point2d::new(x + size, y + size),
            Point2d::new(x, y + size),
        ]
    }

    fn scene() -> Scene {
        let mut store = FeatureStore::new();
        store
            .load(
                vec![
                    Feature::new(
                        Polygon::new(square(0.0, 0.0, 10.0), vec![]),
                        Attributes::new().with("name", "A"),
                    ),
                    Feature::new(
                        Polygon::new(square(20.0, 0.0, 10.0), vec![]),
                        Attributes::new().with("name", "B"),
                    ),
                    Feature::new(
                        Polygon::new(square(5.0, 5.0, 10.0), vec![]),
                        Attributes::new().with("name", "C"),
                    ),
                    Feature::new(
                        Contour::open(vec![Point2d::new(0.0, 40.0), Point2d::new(30.0, 40.0)]),
                        Attributes::new().with("name", "road"),
                    ),
                ],
                Crs::WGS84,
            )
            .expect("valid");
        store.load_markers(vec![Point2d::new(25.0, 30.0)], Crs::WGS84);

        let mut transform = CrsTransformService::new();
        transform.set_projection("EPSG:4326", "EPSG:4326").expect("valid");

        let mut scene = Scene::new();
        scene
            .rebuild_all(&store, &transform, &SceneStyle::default())
            .expect("rebuilds");
        scene
    }

    fn name_of(scene: &Scene, id: PrimitiveId) -> String {
        scene
            .primitive(id)
            .and_then(|p| p.attributes())
            .and_then(|a| a.get("name"))
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn point_pick_takes_top_most() {
        let mut scene = scene();
        let mut engine = HighlightEngine::new();
        let sink = RecordingSink::default();

        let picked = engine
            .pick_point(&mut scene, &Point2d::new(7.0, 7.0), &SceneStyle::default(), &sink)
            .expect("hit");
        assert_eq!(name_of(&scene, picked), "C");
        assert_eq!(engine.highlighted(), &[picked]);
        assert_matches!(
            scene.primitive(picked).expect("exists").state(),
            StyleState::Highlighted { .. }
        );
        assert_eq!(
            sink.take(),
            [Notification::Attributes(Some(Attributes::new().with("name", "C")))]
        );
    }

    #[test]
    fn point_pick_inside_single_polygon() {
        let mut scene = scene();
        let mut engine = HighlightEngine::new();
        let sink = RecordingSink::default();

        let picked = engine
            .pick_point(&mut scene, &Point2d::new(25.0, 5.0), &SceneStyle::default(), &sink)
            .expect("hit");
        assert_eq!(name_of(&scene, picked), "B");
        assert_eq!(engine.highlighted().len(), 1);

        let boundary = engine
            .pick_point(&mut scene, &Point2d::new(20.0, 5.0), &SceneStyle::default(), &sink)
            .expect("boundary counts as inside");
        assert_eq!(boundary, picked);
    }

    #[test]
    fn point_pick_miss_clears_selection() {
        let mut scene = scene();
        let original = scene.clone();
        let mut engine = HighlightEngine::new();
        let sink = RecordingSink::default();

        engine.pick_point(&mut scene, &Point2d::new(1.0, 1.0), &SceneStyle::default(), &sink);
        let missed = engine.pick_point(
            &mut scene,
            &Point2d::new(100.0, 100.0),
            &SceneStyle::default(),
            &sink,
        );

        assert_eq!(missed, None);
        assert!(engine.highlighted().is_empty());
        assert_eq!(scene, original);
        assert_eq!(sink.take().last(), Some(&Notification::Attributes(None)));
    }

    #[test]
    fn region_pick_and_restore() {
        let mut scene = scene();
        let original = scene.clone();
        let mut engine = HighlightEngine::new();
        let sink = RecordingSink::default();

        let selected = engine.pick_region(
            &mut scene,
            Point2d::new(32.0, -1.0),
            Point2d::new(1.0, 1.0),
            &SceneStyle::default(),
            &sink,
        );

        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|id| id.layer == LayerKind::FillPolygons));
        let names: Vec<_> = selected.iter().map(|id| name_of(&scene, *id)).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(
            sink.take(),
            [
                Notification::Table(vec![
                    Attributes::new().with("name", "A"),
                    Attributes::new().with("name", "B"),
                ]),
                Notification::Attributes(Some(Attributes::new().with("name", "A"))),
            ]
        );

        engine.clear_highlights(&mut scene);
        assert!(engine.highlighted().is_empty());
        assert_eq!(scene, original);

        engine.clear_highlights(&mut scene);
        assert_eq!(scene, original);
    }

    #[test]
    fn empty_region_pick_is_not_reported() {
        let mut scene = scene();
        let original = scene.clone();
        let mut engine = HighlightEngine::new();
        let sink = RecordingSink::default();

        engine.pick_region(
            &mut scene,
            Point2d::new(1.0, 1.0),
            Point2d::new(2.0, 2.0),
            &SceneStyle::default(),
            &sink,
        );
        sink.take();

        let selected = engine.pick_region(
            &mut scene,
            Point2d::new(100.0, 100.0),
            Point2d::new(120.0, 110.0),
            &SceneStyle::default(),
            &sink,
        );

        assert!(selected.is_empty());
        assert!(engine.highlighted().is_empty());
        assert_eq!(scene, original);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn region_pick_includes_lines_and_markers() {
        let mut scene = scene();
        let mut engine = HighlightEngine::new();
        let sink = RecordingSink::default();

        let selected = engine.pick_region(
            &mut scene,
            Point2d::new(24.0, 29.0),
            Point2d::new(26.0, 45.0),
            &SceneStyle::default(),
            &sink,
        );
        let layers: Vec<_> = selected.iter().map(|id| id.layer).collect();
        assert_eq!(layers, [LayerKind::Lines, LayerKind::Markers]);
        assert_eq!(
            sink.take(),
            [Notification::Table(vec![]), Notification::Attributes(None)]
        );
    }

    #[test]
    fn highlight_is_idempotent() {
        let mut scene = scene();
        let original = scene.clone();
        let mut engine = HighlightEngine::new();
        let style = SceneStyle::default();
        let id = PrimitiveId::new(LayerKind::FillPolygons, 0);

        assert!(engine.highlight(&mut scene, id, &style, HighlightKind::Pick));
        let once = scene.clone();
        assert!(!engine.highlight(&mut scene, id, &style, HighlightKind::Pick));
        assert_eq!(scene, once);
        assert_eq!(engine.highlighted().len(), 1);

        assert!(!engine.highlight(
            &mut scene,
            PrimitiveId::new(LayerKind::FillPolygons, 100),
            &style,
            HighlightKind::Pick
        ));

        engine.clear_highlights(&mut scene);
        assert_eq!(scene, original);
    }
}
