use meridian_types::{Contour, Point2d, Polygon};

use super::RasterLayout;
use crate::color::Color;
use crate::scene::{Paint, Scene, Shape};

/// Renders the scene as an SVG document with the same layout as the raster output.
pub(crate) fn render_svg(scene: &Scene, layout: &RasterLayout, background: Option<Color>) -> String {
    let mut svg = SvgBuilder::new(layout);
    if let Some(background) = background {
        svg.add_background(background);
    }

    for (_, primitive) in scene.iter_draw_order() {
        let paint = primitive.paint();
        match primitive.shape() {
            Shape::Polygon(polygon) => svg.add_polygon(polygon, paint),
            Shape::Path(contour) => svg.add_path(contour, paint),
            Shape::Disk { center, radius } => {
                svg.add_circle(center, radius * layout.scale(), paint)
            }
            Shape::Marker { position, diameter } => svg.add_circle(position, diameter / 2.0, paint),
        }
    }

    svg.finish()
}

struct SvgBuilder<'a> {
    layout: &'a RasterLayout,
    elements: Vec<String>,
}

impl<'a> SvgBuilder<'a> {
    fn new(layout: &'a RasterLayout) -> Self {
        Self {
            layout,
            elements: Vec::new(),
        }
    }

    fn add_background(&mut self, color: Color) {
        self.elements.push(format!(
            r#"<rect width="{}" height="{}" {}/>"#,
            self.layout.width(),
            self.layout.height(),
            fill_attributes(Some(color)),
        ));
    }

    fn add_polygon(&mut self, polygon: &Polygon, paint: &Paint) {
        let data: Vec<String> = polygon
            .iter_contours()
            .filter_map(|contour| self.path_data(contour, true))
            .collect();
        if data.is_empty() {
            return;
        }

        self.elements.push(format!(
            r#"<path d="{}" fill-rule="evenodd" {} {}/>"#,
            data.join(" "),
            fill_attributes(paint.fill),
            stroke_attributes(paint),
        ));
    }

    fn add_path(&mut self, contour: &Contour, paint: &Paint) {
        let Some(data) = self.path_data(contour, contour.is_closed()) else {
            return;
        };

        let fill = if contour.is_closed() { paint.fill } else { None };
        self.elements.push(format!(
            r#"<path d="{data}" {} {}/>"#,
            fill_attributes(fill),
            stroke_attributes(paint),
        ));
    }

    fn add_circle(&mut self, center: &Point2d, radius: f64, paint: &Paint) {
        if !(radius.is_finite() && radius > 0.0) {
            return;
        }

        let center = self.layout.to_pixel(center);
        self.elements.push(format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{radius:.2}" {} {}/>"#,
            center.x,
            center.y,
            fill_attributes(paint.fill),
            stroke_attributes(paint),
        ));
    }

    fn path_data(&self, contour: &Contour, close: bool) -> Option<String> {
        let mut points = contour.points().iter().map(|p| self.layout.to_pixel(p));
        let first = points.next()?;

        let mut data = format!("M{:.2},{:.2}", first.x, first.y);
        for p in points {
            data.push_str(&format!(" L{:.2},{:.2}", p.x, p.y));
        }
        if close {
            data.push_str(" Z");
        }

        Some(data)
    }

    fn finish(self) -> String {
        let (width, height) = (self.layout.width(), self.layout.height());
        let mut document = format!(
            r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
        );
        document.push('\n');
        for element in &self.elements {
            document.push_str("  ");
            document.push_str(element);
            document.push('\n');
        }
        document.push_str("</svg>\n");

        document
    }
}

fn fill_attributes(fill: Option<Color>) -> String {
    match fill {
        Some(color) if !color.is_transparent() => format!(
            r#"fill="{}" fill-opacity="{:.3}""#,
            color.to_hex_rgb(),
            color.opacity()
        ),
        _ => r#"fill="none""#.to_string(),
    }
}

fn stroke_attributes(paint: &Paint) -> String {
    match paint.stroke {
        Some(stroke) if !stroke.color.is_transparent() => format!(
            r#"stroke="{}" stroke-opacity="{:.3}" stroke-width="{}" stroke-linejoin="round""#,
            stroke.color.to_hex_rgb(),
            stroke.color.opacity(),
            stroke.width,
        ),
        _ => r#"stroke="none""#.to_string(),
    }
}
