use image::RgbaImage;
use meridian_types::{Contour, Point2d, Polygon};
use tiny_skia::{
    FillRule, IntSize, LineCap, LineJoin, Path, PathBuilder, Pixmap, PremultipliedColorU8,
    Transform,
};

use super::RasterLayout;
use crate::color::Color;
use crate::error::MeridianError;
use crate::scene::{Paint, Primitive, Scene, Shape, Stroke};

/// Draws scene primitives into an anti-aliased RGBA pixmap with `tiny-skia`.
///
/// Paths are built relative to the top-left corner of the scene area and mapped into pixels with the Y-flipped
/// layout transform, so large projected coordinates don't lose precision in `f32`.
pub struct Rasterizer {
    pixmap: Pixmap,
    origin: Point2d,
    scale: f64,
    transform: Transform,
}

impl Rasterizer {
    /// Allocates the pixmap for the layout, filled with the background color (transparent if not set).
    pub fn new(layout: &RasterLayout, background: Option<Color>) -> Result<Self, MeridianError> {
        let (width, height) = (layout.width(), layout.height());
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| MeridianError::Render(format!("invalid image size {width}x{height}")))?;
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| MeridianError::Render(format!("image {width}x{height} is too large")))?;

        let mut buffer: Vec<u8> = Vec::new();
        buffer.try_reserve_exact(len).map_err(|err| {
            MeridianError::Render(format!("cannot allocate {width}x{height} image: {err}"))
        })?;
        buffer.resize(len, 0);

        let mut pixmap = Pixmap::from_vec(buffer, size)
            .ok_or_else(|| MeridianError::Render("invalid image buffer".into()))?;
        if let Some(background) = background {
            pixmap.fill(tiny_skia::Color::from_rgba8(
                background.r(),
                background.g(),
                background.b(),
                background.a(),
            ));
        }

        let rect = layout.scene_rect();
        let origin = Point2d::new(rect.x_min, rect.y_max);
        let offset = layout.to_pixel(&origin);
        let scale = layout.scale();
        let transform = Transform::from_row(
            scale as f32,
            0.0,
            0.0,
            -scale as f32,
            offset.x as f32,
            offset.y as f32,
        );

        Ok(Self {
            pixmap,
            origin,
            scale,
            transform,
        })
    }

    /// Draws all primitives of the scene bottom to top.
    pub fn draw_scene(&mut self, scene: &Scene) {
        for (_, primitive) in scene.iter_draw_order() {
            self.draw_primitive(primitive);
        }
    }

    /// Returns the rendered image with straight (not premultiplied) alpha.
    pub fn into_image(self) -> Result<RgbaImage, MeridianError> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut data = self.pixmap.take();
        for pixel in data.chunks_exact_mut(4) {
            if let Some(color) =
                PremultipliedColorU8::from_rgba(pixel[0], pixel[1], pixel[2], pixel[3])
            {
                let color = color.demultiply();
                pixel.copy_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
            }
        }

        RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| MeridianError::Render("invalid image buffer".into()))
    }

    fn draw_primitive(&mut self, primitive: &Primitive) {
        let paint = primitive.paint();
        match primitive.shape() {
            Shape::Polygon(polygon) => {
                if let Some(path) = self.polygon_path(polygon) {
                    self.draw_path(&path, paint, true);
                }
            }
            Shape::Path(contour) => {
                if let Some(path) = self.contour_path(contour) {
                    self.draw_path(&path, paint, contour.is_closed());
                }
            }
            Shape::Disk { center, radius } => {
                self.draw_circle(center, *radius, paint);
            }
            Shape::Marker { position, diameter } => {
                self.draw_circle(position, diameter / 2.0 / self.scale, paint);
            }
        }
    }

    fn draw_circle(&mut self, center: &Point2d, radius: f64, paint: &Paint) {
        if !(radius.is_finite() && radius > 0.0) {
            log::debug!("Skipping circle with radius {radius}");
            return;
        }

        let (x, y) = self.local(center);
        match PathBuilder::from_circle(x, y, radius as f32) {
            Some(path) => self.draw_path(&path, paint, true),
            None => log::debug!("Skipping circle at {center:?}"),
        }
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint, fill: bool) {
        if let (Some(color), true) = (paint.fill, fill) {
            if !color.is_transparent() {
                self.pixmap.fill_path(
                    path,
                    &skia_paint(color),
                    FillRule::EvenOdd,
                    self.transform,
                    None,
                );
            }
        }

        if let Some(stroke) = paint.stroke {
            self.stroke_path(path, stroke);
        }
    }

    fn stroke_path(&mut self, path: &Path, stroke: Stroke) {
        if !(stroke.width.is_finite() && stroke.width > 0.0) || stroke.color.is_transparent() {
            return;
        }

        // Stroke widths are in pixels, while the path is in scene units.
        let options = tiny_skia::Stroke {
            width: (stroke.width / self.scale) as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        self.pixmap.stroke_path(
            path,
            &skia_paint(stroke.color),
            &options,
            self.transform,
            None,
        );
    }

    fn local(&self, point: &Point2d) -> (f32, f32) {
        (
            (point.x - self.origin.x) as f32,
            (point.y - self.origin.y) as f32,
        )
    }

    fn add_ring(&self, builder: &mut PathBuilder, contour: &Contour, close: bool) {
        let mut points = contour.points().iter().map(|p| self.local(p));
        let Some((x, y)) = points.next() else {
            return;
        };

        builder.move_to(x, y);
        for (x, y) in points {
            builder.line_to(x, y);
        }
        if close {
            builder.close();
        }
    }

    fn polygon_path(&self, polygon: &Polygon) -> Option<Path> {
        let mut builder = PathBuilder::new();
        for contour in polygon.iter_contours() {
            self.add_ring(&mut builder, contour, true);
        }

        builder.finish()
    }

    fn contour_path(&self, contour: &Contour) -> Option<Path> {
        let mut builder = PathBuilder::new();
        self.add_ring(&mut builder, contour, contour.is_closed());
        builder.finish()
    }
}

fn skia_paint(color: Color) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
    paint.anti_alias = true;
    paint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LayerKind, PrimitiveKind};

    fn layout(scene: &Scene, size: u32) -> RasterLayout {
        RasterLayout::new(scene, Some(size), Some(size)).expect("valid layout")
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2d> {
        vec![
            Point2d::new(x, y),
            Point2d::new(x + size, y),
            Point2d::new(x + size, y + size),
            Point2d::new(x, y + size),
        ]
    }

    fn render(scene: &Scene, size: u32) -> RgbaImage {
        let layout = layout(scene, size);
        let mut rasterizer = Rasterizer::new(&layout, None).expect("allocates");
        rasterizer.draw_scene(scene);
        rasterizer.into_image().expect("valid image")
    }

    #[test]
    fn polygon_with_hole() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(
                square(0.0, 0.0, 100.0),
                vec![square(40.0, 40.0, 20.0)],
            )),
            Paint::fill(Color::LAND),
        ));

        let image = render(&scene, 100);
        assert_eq!(image.get_pixel(10, 10).0, Color::LAND.to_u8_array());
        assert_eq!(image.get_pixel(50, 50).0, [0, 0, 0, 0]);
    }

    #[test]
    fn vertical_axis_is_flipped() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::Background).push(Primitive::new(
            PrimitiveKind::Background,
            Shape::Polygon(Polygon::new(square(0.0, 0.0, 100.0), vec![])),
            Paint::fill(Color::OCEAN),
        ));
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(square(0.0, 50.0, 100.0), vec![])),
            Paint::fill(Color::LAND),
        ));

        let image = render(&scene, 100);
        // The upper half of the scene is the upper half of the image.
        assert_eq!(image.get_pixel(50, 25).0, Color::LAND.to_u8_array());
        assert_eq!(image.get_pixel(50, 75).0, Color::OCEAN.to_u8_array());
    }

    #[test]
    fn far_from_origin_coordinates() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(square(500_000.0, 5_000_000.0, 100.0), vec![])),
            Paint::fill(Color::LAND),
        ));
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(
                square(500_040.0, 5_000_040.0, 20.0),
                vec![],
            )),
            Paint::fill(Color::OCEAN),
        ));

        let image = render(&scene, 1000);
        assert_eq!(image.get_pixel(395, 500).0, Color::LAND.to_u8_array());
        assert_eq!(image.get_pixel(405, 500).0, Color::OCEAN.to_u8_array());
        assert_eq!(image.get_pixel(594, 500).0, Color::OCEAN.to_u8_array());
        assert_eq!(image.get_pixel(605, 500).0, Color::LAND.to_u8_array());
    }

    #[test]
    fn draw_order_and_markers() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(square(0.0, 0.0, 100.0), vec![])),
            Paint::fill(Color::LAND),
        ));
        scene.layer_mut(LayerKind::Markers).push(Primitive::new(
            PrimitiveKind::MarkerIcon,
            Shape::Marker {
                position: Point2d::new(50.0, 50.0),
                diameter: 10.0,
            },
            Paint::fill(Color::RED),
        ));

        let image = render(&scene, 100);
        assert_eq!(image.get_pixel(50, 50).0, Color::RED.to_u8_array());
        assert_eq!(image.get_pixel(50, 40).0, Color::LAND.to_u8_array());
    }

    #[test]
    fn marker_diameter_is_in_pixels() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(square(0.0, 0.0, 10.0), vec![])),
            Paint::fill(Color::LAND),
        ));
        scene.layer_mut(LayerKind::Markers).push(Primitive::new(
            PrimitiveKind::MarkerIcon,
            Shape::Marker {
                position: Point2d::new(5.0, 5.0),
                diameter: 20.0,
            },
            Paint::fill(Color::RED),
        ));

        // 10 pixels per scene unit: a 20 pixel marker covers 2 scene units.
        let image = render(&scene, 100);
        assert_eq!(image.get_pixel(50, 50).0, Color::RED.to_u8_array());
        assert_eq!(image.get_pixel(50, 56).0, Color::RED.to_u8_array());
        assert_eq!(image.get_pixel(50, 65).0, Color::LAND.to_u8_array());
    }

    #[test]
    fn semi_transparent_fill_is_blended_once() {
        let mut scene = Scene::new();
        let half_red = Color::rgba(255, 0, 0, 128);
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(square(0.0, 0.0, 100.0), vec![])),
            Paint::fill(half_red),
        ));

        let image = render(&scene, 100);
        let first = image.get_pixel(10, 10).0;
        assert!((127..=129).contains(&first[3]), "alpha {}", first[3]);
        for (x, y) in [(50, 50), (90, 20), (20, 90), (30, 70)] {
            assert_eq!(image.get_pixel(x, y).0, first);
        }
    }

    #[test]
    fn thin_strokes_are_faded() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::FillPolygons).push(Primitive::new(
            PrimitiveKind::FillPolygon,
            Shape::Polygon(Polygon::new(square(0.0, 0.0, 100.0), vec![])),
            Paint::fill(Color::LAND),
        ));
        scene.layer_mut(LayerKind::Lines).push(Primitive::new(
            PrimitiveKind::LinePath,
            Shape::Path(Contour::open(vec![
                Point2d::new(0.0, 50.5),
                Point2d::new(100.0, 50.5),
            ])),
            Paint::stroke(Stroke::new(Color::BLACK, 0.3)),
        ));

        let image = render(&scene, 100);
        let column: Vec<[u8; 4]> = (47..53).map(|y| image.get_pixel(50, y).0).collect();
        assert!(column.iter().any(|p| *p != Color::LAND.to_u8_array()));
        assert!(column.iter().all(|p| *p != Color::BLACK.to_u8_array()));
    }

    #[test]
    fn background_color() {
        let mut scene = Scene::new();
        scene.layer_mut(LayerKind::Background).push(Primitive::new(
            PrimitiveKind::Background,
            Shape::Disk {
                center: Point2d::new(0.0, 0.0),
                radius: 50.0,
            },
            Paint::fill(Color::OCEAN),
        ));

        let layout = layout(&scene, 100);
        let mut rasterizer = Rasterizer::new(&layout, Some(Color::WHITE)).expect("allocates");
        rasterizer.draw_scene(&scene);
        let image = rasterizer.into_image().expect("valid image");

        assert_eq!(image.get_pixel(0, 0).0, Color::WHITE.to_u8_array());
        assert_eq!(image.get_pixel(50, 50).0, Color::OCEAN.to_u8_array());
    }
}
