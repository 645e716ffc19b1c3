//! Layered scene of renderable primitives.
//!
//! A [`Scene`] always has the same set of layers, one per [`LayerKind`], stored in draw order. Each layer holds a
//! list of [`Primitive`]s in insertion order. Everything else in the crate (selection, queries and export) works
//! with the scene through [`PrimitiveId`]s, which stay valid until the layer they point to is rebuilt.

use std::sync::Arc;

use meridian_types::{Contour, Point2d, Polygon, Rect};

use crate::attributes::Attributes;

mod builder;
mod style;

pub use builder::RebuildReport;
pub use style::{HighlightKind, Paint, SceneStyle, StyleState, Stroke};

/// Layers of the scene, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    /// Projection extent background (ocean).
    Background,
    /// Filled land polygons.
    FillPolygons,
    /// Line features.
    Lines,
    /// Administrative boundary outlines drawn over the polygons.
    Boundaries,
    /// Outline of the projection extent.
    Frame,
    /// Point markers.
    Markers,
}

impl LayerKind {
    /// All layers in draw order.
    pub const ALL: [LayerKind; 6] = [
        LayerKind::Background,
        LayerKind::FillPolygons,
        LayerKind::Lines,
        LayerKind::Boundaries,
        LayerKind::Frame,
        LayerKind::Markers,
    ];

    /// Stacking value of the layer. Higher values are drawn on top.
    pub fn z(&self) -> u32 {
        match self {
            LayerKind::Background => 0,
            LayerKind::FillPolygons | LayerKind::Lines => 1,
            LayerKind::Boundaries | LayerKind::Frame => 3,
            LayerKind::Markers => 4,
        }
    }

    fn position(&self) -> usize {
        match self {
            LayerKind::Background => 0,
            LayerKind::FillPolygons => 1,
            LayerKind::Lines => 2,
            LayerKind::Boundaries => 3,
            LayerKind::Frame => 4,
            LayerKind::Markers => 5,
        }
    }
}

/// Identifier of a primitive in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId {
    /// Layer of the primitive.
    pub layer: LayerKind,
    /// Position of the primitive in the layer.
    pub index: usize,
}

impl PrimitiveId {
    /// Creates a new id.
    pub fn new(layer: LayerKind, index: usize) -> Self {
        Self { layer, index }
    }
}

/// Kind of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Background of the projection extent.
    Background,
    /// Filled polygon of a feature.
    FillPolygon,
    /// Line of a feature.
    LinePath,
    /// Boundary overlay or the projection frame.
    BoundaryPath,
    /// Point marker.
    MarkerIcon,
}

impl PrimitiveKind {
    /// Returns true if the primitive can be picked by the user.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::FillPolygon | PrimitiveKind::LinePath | PrimitiveKind::MarkerIcon
        )
    }
}

/// Shape of a primitive in scene (target CRS) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Polygon with holes.
    Polygon(Polygon),
    /// Open or closed path.
    Path(Contour),
    /// Disk (or circle for outline-only paint).
    Disk {
        /// Center of the disk.
        center: Point2d,
        /// Radius in scene units.
        radius: f64,
    },
    /// Symbol of a fixed pixel size anchored at a point.
    Marker {
        /// Anchor position.
        position: Point2d,
        /// Diameter in pixels.
        diameter: f64,
    },
}

impl Shape {
    /// Bounding rectangle in scene units. Markers contribute only their position.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Shape::Polygon(polygon) => polygon.bounding_rect(),
            Shape::Path(contour) => contour.bounding_rect(),
            Shape::Disk { center, radius } => Some(Rect::around(*center, *radius)),
            Shape::Marker { position, .. } => Some(Rect::around(*position, 0.0)),
        }
    }

    /// Returns true if the point is inside the shape.
    pub fn contains_point(&self, point: &Point2d) -> bool {
        match self {
            Shape::Polygon(polygon) => polygon.contains_point(point),
            Shape::Path(contour) => contour.is_closed() && contour.contains_point(point),
            Shape::Disk { center, radius } => (point - center).norm() <= *radius,
            Shape::Marker { position, .. } => position == point,
        }
    }

    /// Returns true if the shape has at least one common point with the rectangle.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        match self {
            Shape::Polygon(polygon) => {
                polygon.outer_contour.intersects_rect(rect)
                    && !polygon.inner_contours.iter().any(|hole| {
                        let Some(bbox) = hole.bounding_rect() else {
                            return false;
                        };
                        rect.x_min > bbox.x_min
                            && rect.x_max < bbox.x_max
                            && rect.y_min > bbox.y_min
                            && rect.y_max < bbox.y_max
                            && rect.into_quadrangle().iter().all(|p| hole.contains_point(p))
                            && !hole.iter_segments().any(|s| rect.intersects_segment(&s))
                    })
            }
            Shape::Path(contour) => contour.intersects_rect(rect),
            Shape::Disk { center, radius } => {
                let nearest = Point2d::new(
                    center.x.clamp(rect.x_min, rect.x_max),
                    center.y.clamp(rect.y_min, rect.y_max),
                );
                (nearest - center).norm() <= *radius
            }
            Shape::Marker { position, .. } => rect.contains(position),
        }
    }
}

/// Renderable item of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    kind: PrimitiveKind,
    shape: Shape,
    paint: Paint,
    state: StyleState,
    attributes: Option<Arc<Attributes>>,
    source_index: Option<usize>,
}

impl Primitive {
    /// Creates a new primitive in the default style state.
    pub fn new(kind: PrimitiveKind, shape: Shape, paint: Paint) -> Self {
        Self {
            kind,
            shape,
            paint,
            state: StyleState::Default,
            attributes: None,
            source_index: None,
        }
    }

    /// Sets the feature (or marker) index the primitive was built from.
    pub fn with_source(mut self, index: usize) -> Self {
        self.source_index = Some(index);
        self
    }

    /// Sets the attribute record of the feature the primitive was built from.
    pub fn with_attributes(mut self, attributes: Arc<Attributes>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Kind of the primitive.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Shape in scene coordinates.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Paint the primitive is currently drawn with.
    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// Highlight state.
    pub fn state(&self) -> &StyleState {
        &self.state
    }

    /// Attribute record of the source feature. Fill polygons always have one.
    pub fn attributes(&self) -> Option<&Arc<Attributes>> {
        self.attributes.as_ref()
    }

    /// Index of the source feature for feature primitives, or of the marker for marker icons.
    pub fn source_index(&self) -> Option<usize> {
        self.source_index
    }

    /// Applies a highlight paint. The paint saved on the first highlight is kept, so repeated calls never lose the
    /// original paint.
    pub(crate) fn apply_highlight(&mut self, paint: Paint, kind: HighlightKind) {
        let saved = self.state.saved_paint().copied().unwrap_or(self.paint);
        self.state = match kind {
            HighlightKind::Pick => StyleState::Highlighted { saved },
            HighlightKind::Query => StyleState::QueryMatched { saved },
        };
        self.paint = paint;
    }

    /// Restores the paint saved before highlighting.
    pub(crate) fn restore(&mut self) {
        if let Some(saved) = self.state.saved_paint() {
            self.paint = *saved;
        }
        self.state = StyleState::Default;
    }
}

/// Ordered list of primitives of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    kind: LayerKind,
    primitives: Vec<Primitive>,
}

impl Layer {
    fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            primitives: vec![],
        }
    }

    /// Kind of the layer.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Primitives in insertion order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns true if the layer has no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub(crate) fn push(&mut self, primitive: Primitive) -> PrimitiveId {
        self.primitives.push(primitive);
        PrimitiveId::new(self.kind, self.primitives.len() - 1)
    }

    pub(crate) fn clear(&mut self) {
        self.primitives.clear();
    }
}

/// Layered collection of primitives. See module documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    layers: Vec<Layer>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            layers: LayerKind::ALL.into_iter().map(Layer::new).collect(),
        }
    }
}

impl Scene {
    /// Creates a scene with all layers empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the layer of the given kind.
    pub fn layer(&self, kind: LayerKind) -> &Layer {
        &self.layers[kind.position()]
    }

    pub(crate) fn layer_mut(&mut self, kind: LayerKind) -> &mut Layer {
        &mut self.layers[kind.position()]
    }

    /// All layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns the primitive with the given id.
    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.layer(id.layer).primitives.get(id.index)
    }

    pub(crate) fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.layer_mut(id.layer).primitives.get_mut(id.index)
    }

    /// Iterates over all primitives bottom to top.
    ///
    /// Primitives are ordered by the z value of their layer. Ties are resolved by layer order and then by insertion
    /// order inside the layer.
    pub fn iter_draw_order(&self) -> impl DoubleEndedIterator<Item = (PrimitiveId, &Primitive)> {
        self.layers.iter().flat_map(|layer| {
            layer
                .primitives
                .iter()
                .enumerate()
                .map(move |(index, primitive)| (PrimitiveId::new(layer.kind, index), primitive))
        })
    }

    /// Iterates over all primitives top to bottom.
    pub fn iter_top_down(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> {
        self.iter_draw_order().rev()
    }

    /// Total number of primitives in all layers.
    pub fn primitive_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Returns true if there are no primitives in any layer.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    /// Removes all primitives from all layers.
    pub fn clear_all(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    /// Bounding rectangle of all primitives. Markers contribute their anchor position.
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.iter_draw_order()
            .filter_map(|(_, primitive)| primitive.shape.bounding_rect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn marker(x: f64, y: f64) -> Primitive {
        Primitive::new(
            PrimitiveKind::MarkerIcon,
            Shape::Marker {
                position: Point2d::new(x, y),
                diameter: 5.0,
            },
            Paint::fill(Color::RED),
        )
    }

    #[test]
    fn layers_are_ordered_by_z() {
        let z: Vec<_> = LayerKind::ALL.iter().map(LayerKind::z).collect();
        assert!(z.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(LayerKind::Background.z(), 0);
        assert_eq!(LayerKind::Boundaries.z(), 3);
        assert_eq!(LayerKind::Markers.z(), 4);
    }

    #[test]
    fn draw_order_iteration() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::Markers).push(marker(0.0, 0.0));
        scene.layer_mut(LayerKind::Background).push(Primitive::new(
            PrimitiveKind::Background,
            Shape::Disk {
                center: Point2d::new(0.0, 0.0),
                radius: 1.0,
            },
            Paint::fill(Color::OCEAN),
        ));
        scene.layer_mut(LayerKind::Markers).push(marker(1.0, 1.0));

        let ids: Vec<_> = scene.iter_draw_order().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            [
                PrimitiveId::new(LayerKind::Background, 0),
                PrimitiveId::new(LayerKind::Markers, 0),
                PrimitiveId::new(LayerKind::Markers, 1),
            ]
        );

        let top = scene.iter_top_down().next().map(|(id, _)| id);
        assert_eq!(top, Some(PrimitiveId::new(LayerKind::Markers, 1)));
        assert_eq!(scene.bounding_rect(), Some(Rect::new(-1.0, -1.0, 1.0, 1.0)));

        scene.clear_all();
        assert!(scene.is_empty());
        assert_eq!(scene.bounding_rect(), None);
    }

    #[test]
    fn highlight_keeps_first_saved_paint() {
        let mut primitive = marker(0.0, 0.0);
        let original = *primitive.paint();
        let first = Paint::fill(Color::BLUE);
        let second = Paint::fill(Color::BLACK);

        primitive.apply_highlight(first, HighlightKind::Pick);
        primitive.apply_highlight(second, HighlightKind::Query);
        assert_eq!(primitive.state().saved_paint(), Some(&original));
        assert_eq!(primitive.paint(), &second);

        primitive.restore();
        assert_eq!(primitive.paint(), &original);
        assert_eq!(primitive.state(), &StyleState::Default);
    }

    #[test]
    fn shape_hit_tests() {
        let polygon = Shape::Polygon(Polygon::new(
            vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(10.0, 0.0),
                Point2d::new(10.0, 10.0),
                Point2d::new(0.0, 10.0),
            ],
            vec![vec![
                Point2d::new(2.0, 2.0),
                Point2d::new(8.0, 2.0),
                Point2d::new(8.0, 8.0),
                Point2d::new(2.0, 8.0),
            ]],
        ));

        assert!(polygon.contains_point(&Point2d::new(1.0, 1.0)));
        assert!(!polygon.contains_point(&Point2d::new(5.0, 5.0)));
        assert!(polygon.intersects_rect(&Rect::new(-1.0, -1.0, 0.5, 0.5)));
        assert!(!polygon.intersects_rect(&Rect::new(4.0, 4.0, 6.0, 6.0)));
        assert!(polygon.intersects_rect(&Rect::new(4.0, 4.0, 9.0, 6.0)));
        assert!(!polygon.intersects_rect(&Rect::new(11.0, 11.0, 12.0, 12.0)));

        let disk = Shape::Disk {
            center: Point2d::new(0.0, 0.0),
            radius: 1.0,
        };
        assert!(disk.intersects_rect(&Rect::new(0.5, 0.5, 2.0, 2.0)));
        assert!(!disk.intersects_rect(&Rect::new(0.8, 0.8, 2.0, 2.0)));
    }
}
