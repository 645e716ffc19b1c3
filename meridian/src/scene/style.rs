use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Outline of a primitive. Width is in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Line color.
    pub color: Color,
    /// Line width in pixels.
    pub width: f64,
}

impl Stroke {
    /// Creates a new stroke.
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// Visual style of a single primitive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Paint {
    /// Fill color of the inner area. `None` for outline-only primitives.
    pub fill: Option<Color>,
    /// Outline. `None` for fill-only primitives.
    pub stroke: Option<Stroke>,
}

impl Paint {
    /// Fill without outline.
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    /// Outline without fill.
    pub fn stroke(stroke: Stroke) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
        }
    }

    /// Fill with outline.
    pub fn fill_and_stroke(fill: Color, stroke: Stroke) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(stroke),
        }
    }

    /// Returns a copy of the paint with the outline color replaced and the outline width doubled. Primitives without
    /// an outline get one of `min_width` pixels.
    pub(crate) fn emphasized(&self, color: Color, fill: Option<Color>, min_width: f64) -> Paint {
        let width = self
            .stroke
            .map(|stroke| stroke.width * 2.0)
            .unwrap_or(0.0)
            .max(min_width);

        Paint {
            fill: match self.fill {
                Some(_) => fill.or(self.fill),
                None => None,
            },
            stroke: Some(Stroke::new(color, width)),
        }
    }
}

/// Highlight state of a primitive.
///
/// A highlighted primitive remembers the paint it had before, so clearing the highlight always restores it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StyleState {
    /// Primitive is drawn with its own paint.
    #[default]
    Default,
    /// Primitive was selected by a pick.
    Highlighted {
        /// Paint before highlighting.
        saved: Paint,
    },
    /// Primitive matched an attribute query.
    QueryMatched {
        /// Paint before highlighting.
        saved: Paint,
    },
}

impl StyleState {
    /// Returns true if the primitive is highlighted in any way.
    pub fn is_highlighted(&self) -> bool {
        !matches!(self, StyleState::Default)
    }

    /// Paint saved before highlighting.
    pub fn saved_paint(&self) -> Option<&Paint> {
        match self {
            StyleState::Default => None,
            StyleState::Highlighted { saved } | StyleState::QueryMatched { saved } => Some(saved),
        }
    }
}

/// Kind of highlight applied to primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    /// Selected by a point or region pick.
    Pick,
    /// Matched by an attribute query.
    Query,
}

/// Colors, widths and symbol sizes used to build the scene.
///
/// Can be loaded from JSON; missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneStyle {
    /// Background (ocean) color.
    pub background: Color,
    /// Fill of land polygons.
    pub polygon_fill: Color,
    /// Outline of land polygons.
    pub polygon_stroke: Stroke,
    /// Lines.
    pub line_stroke: Stroke,
    /// Administrative boundary overlays drawn over polygons.
    pub boundary_stroke: Stroke,
    /// Outline of the projection extent.
    pub frame_stroke: Stroke,
    /// Marker color.
    pub marker_color: Color,
    /// Marker diameter in pixels at scale `1.0`.
    pub marker_size: f64,
    /// Marker scale.
    pub marker_scale: f64,
    /// Outline color of picked primitives.
    pub highlight_color: Color,
    /// Fill of picked polygons.
    pub highlight_fill: Color,
    /// Outline color of primitives matching a query.
    pub query_color: Color,
    /// Fill of polygons matching a query.
    pub query_fill: Color,
    /// Minimum outline width of highlighted primitives.
    pub highlight_min_width: f64,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            background: Color::OCEAN,
            polygon_fill: Color::LAND,
            polygon_stroke: Stroke::new(Color::BLACK, 0.5),
            line_stroke: Stroke::new(Color::BLUE, 1.5),
            boundary_stroke: Stroke::new(Color::BLACK, 0.2),
            frame_stroke: Stroke::new(Color::BLACK, 2.0),
            marker_color: Color::RED,
            marker_size: 10.0,
            marker_scale: 0.5,
            highlight_color: Color::RED,
            highlight_fill: Color::rgba(255, 0, 0, 100),
            query_color: Color::ORANGE,
            query_fill: Color::rgba(255, 255, 0, 100),
            highlight_min_width: 2.0,
        }
    }
}

impl SceneStyle {
    /// Sets background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Sets fill and outline of polygons.
    pub fn with_polygon_paint(mut self, fill: Color, stroke: Stroke) -> Self {
        self.polygon_fill = fill;
        self.polygon_stroke = stroke;
        self
    }

    /// Sets line style.
    pub fn with_line_stroke(mut self, stroke: Stroke) -> Self {
        self.line_stroke = stroke;
        self
    }

    /// Sets marker color and diameter at scale `1.0`.
    pub fn with_marker(mut self, color: Color, size: f64) -> Self {
        self.marker_color = color;
        self.marker_size = size;
        self
    }

    /// Sets marker scale.
    pub fn with_marker_scale(mut self, scale: f64) -> Self {
        self.marker_scale = scale;
        self
    }

    /// Marker diameter in pixels with the current scale applied.
    pub fn marker_diameter(&self) -> f64 {
        self.marker_size * self.marker_scale
    }

    /// Default paint of fill polygons.
    pub fn polygon_paint(&self) -> Paint {
        Paint::fill_and_stroke(self.polygon_fill, self.polygon_stroke)
    }

    /// Paint applied to a highlighted primitive with the given original paint.
    pub fn highlight_paint(&self, original: &Paint, kind: HighlightKind) -> Paint {
        match kind {
            HighlightKind::Pick => original.emphasized(
                self.highlight_color,
                Some(self.highlight_fill),
                self.highlight_min_width,
            ),
            HighlightKind::Query => original.emphasized(
                self.query_color,
                Some(self.query_fill),
                self.highlight_min_width,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_doubles_width() {
        let style = SceneStyle::default();
        let original = style.polygon_paint();
        let highlighted = style.highlight_paint(&original, HighlightKind::Pick);
        let stroke = highlighted.stroke.expect("has stroke");
        assert_eq!(stroke.color, Color::RED);
        assert_eq!(stroke.width, 2.0);

        let line = Paint::stroke(Stroke::new(Color::BLUE, 1.5));
        let highlighted = style.highlight_paint(&line, HighlightKind::Pick);
        assert_eq!(highlighted.stroke.map(|s| s.width), Some(3.0));
        assert_eq!(highlighted.fill, None);
    }

    #[test]
    fn query_differs_from_pick() {
        let style = SceneStyle::default();
        let original = style.polygon_paint();
        assert_ne!(
            style.highlight_paint(&original, HighlightKind::Pick),
            style.highlight_paint(&original, HighlightKind::Query)
        );
    }

    #[test]
    fn style_from_partial_json() {
        let style: SceneStyle =
            serde_json::from_str(r##"{"background": "#FFFFFF", "marker_scale": 1.5}"##)
                .expect("deserializes");
        assert_eq!(style.background, Color::WHITE);
        assert_eq!(style.marker_scale, 1.5);
        assert_eq!(style.polygon_fill, Color::LAND);
        assert_eq!(style.marker_diameter(), 15.0);
    }
}
