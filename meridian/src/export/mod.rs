//! Rendering of the scene into images and vector pages.
//!
//! The scene is fit into the output with a uniform scale and centered. Scene Y axis grows up while image rows grow
//! down, so the layout flips the vertical axis. The same [`RasterLayout`] is used by the raster and the SVG outputs,
//! so both show exactly the same picture.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageOutputFormat, RgbImage, RgbaImage};
use meridian_types::{Point2d, Rect};
use nalgebra::Matrix3;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::MeridianError;
use crate::scene::Scene;

mod raster;
mod svg;

pub use raster::Rasterizer;

/// Maximum width and height of an output image in pixels.
pub const MAX_RASTER_DIMENSION: u32 = 32767;

/// Encoding of the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Lossless PNG with alpha channel.
    Png,
    /// JPEG. Transparent areas are flattened over white.
    Jpeg {
        /// Encoder quality, 1 to 100.
        quality: u8,
    },
    /// SVG page with the scene as vector paths.
    Svg,
}

impl ExportFormat {
    /// Guesses the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg { quality: 90 }),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Usual file extension of the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
            ExportFormat::Svg => "svg",
        }
    }
}

/// Export parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output width. If not set, the width of the scene in scene units is used.
    pub width: Option<u32>,
    /// Output height. If not set, the height of the scene in scene units is used.
    pub height: Option<u32>,
    /// Color of the areas not covered by the scene. Transparent if not set.
    pub background: Option<Color>,
    /// Largest allowed width and height of the output. It cannot raise the limit above [`MAX_RASTER_DIMENSION`].
    pub max_dimension: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            background: None,
            max_dimension: MAX_RASTER_DIMENSION,
        }
    }
}

impl ExportOptions {
    /// Sets output size hints.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Sets the size cap of the output.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

/// Mapping of the scene into the pixel space of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayout {
    width: u32,
    height: u32,
    scene_rect: Rect,
    scale: f64,
    transform: Matrix3<f64>,
}

impl RasterLayout {
    /// Computes the layout of the scene.
    ///
    /// Fails with [`MeridianError::EmptyScene`] if the scene has no primitives or its bounding box has zero area.
    pub fn new(
        scene: &Scene,
        width_hint: Option<u32>,
        height_hint: Option<u32>,
    ) -> Result<Self, MeridianError> {
        let rect = scene.bounding_rect().ok_or(MeridianError::EmptyScene)?;
        Self::for_rect(rect, width_hint, height_hint)
    }

    /// Computes the layout of the scene for the size hints and the size cap of the options.
    pub fn for_options(scene: &Scene, options: &ExportOptions) -> Result<Self, MeridianError> {
        let rect = scene.bounding_rect().ok_or(MeridianError::EmptyScene)?;
        Self::fit(rect, options.width, options.height, options.max_dimension)
    }

    /// Computes the layout of the given scene area.
    ///
    /// Without hints the output size is the size of the area in scene units, truncated to integers. Both
    /// dimensions are capped at [`MAX_RASTER_DIMENSION`] independently.
    pub fn for_rect(
        rect: Rect,
        width_hint: Option<u32>,
        height_hint: Option<u32>,
    ) -> Result<Self, MeridianError> {
        Self::fit(rect, width_hint, height_hint, MAX_RASTER_DIMENSION)
    }

    fn fit(
        rect: Rect,
        width_hint: Option<u32>,
        height_hint: Option<u32>,
        max_dimension: u32,
    ) -> Result<Self, MeridianError> {
        let area = rect.area();
        if !area.is_finite() || area <= 0.0 {
            return Err(MeridianError::EmptyScene);
        }

        let max_dimension = max_dimension.min(MAX_RASTER_DIMENSION);
        let width = output_dimension(width_hint, rect.width(), max_dimension, "width")?;
        let height = output_dimension(height_hint, rect.height(), max_dimension, "height")?;

        let scale = (width as f64 / rect.width()).min(height as f64 / rect.height());
        let offset_x = (width as f64 - rect.width() * scale) / 2.0;
        let offset_y = (height as f64 - rect.height() * scale) / 2.0;

        #[rustfmt::skip]
        let transform = Matrix3::new(
            scale, 0.0, offset_x - rect.x_min * scale,
            0.0, -scale, offset_y + rect.y_max * scale,
            0.0, 0.0, 1.0,
        );

        log::debug!("Raster layout {width}x{height}, scale {scale}");
        Ok(Self {
            width,
            height,
            scene_rect: rect,
            scale,
            transform,
        })
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Scene area mapped into the output.
    pub fn scene_rect(&self) -> Rect {
        self.scene_rect
    }

    /// Pixels per scene unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Converts a scene point into pixel coordinates (origin at the top-left corner).
    pub fn to_pixel(&self, point: &Point2d) -> Point2d {
        self.transform.transform_point(point)
    }
}

fn output_dimension(
    hint: Option<u32>,
    span: f64,
    max_dimension: u32,
    name: &str,
) -> Result<u32, MeridianError> {
    let value = match hint {
        Some(hint) => hint,
        None => span
            .min(max_dimension as f64)
            .trunc()
            .to_u32()
            .unwrap_or(0),
    };
    let value = value.min(max_dimension);

    if value == 0 {
        return Err(MeridianError::Render(format!("output {name} is zero")));
    }

    Ok(value)
}

/// Renders the scene into an RGBA image.
pub fn render(scene: &Scene, options: &ExportOptions) -> Result<RgbaImage, MeridianError> {
    let layout = RasterLayout::for_options(scene, options)?;
    let mut rasterizer = Rasterizer::new(&layout, options.background)?;
    rasterizer.draw_scene(scene);

    log::info!(
        "Rendered {} primitives into {}x{} image",
        scene.primitive_count(),
        layout.width(),
        layout.height()
    );
    rasterizer.into_image()
}

/// Renders the scene and encodes it with the given format.
pub fn encode(
    scene: &Scene,
    options: &ExportOptions,
    format: ExportFormat,
) -> Result<Vec<u8>, MeridianError> {
    match format {
        ExportFormat::Svg => {
            let layout = RasterLayout::for_options(scene, options)?;
            Ok(svg::render_svg(scene, &layout, options.background).into_bytes())
        }
        ExportFormat::Png => {
            let image = render(scene, options)?;
            let mut bytes = Cursor::new(Vec::new());
            DynamicImage::ImageRgba8(image).write_to(&mut bytes, ImageOutputFormat::Png)?;
            Ok(bytes.into_inner())
        }
        ExportFormat::Jpeg { quality } => {
            let image = render(scene, options)?;
            let flattened = flatten_over_white(&image);
            let mut bytes = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(flattened)
                .write_to(&mut bytes, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?;
            Ok(bytes.into_inner())
        }
    }
}

/// Encodes the scene and writes it into a file. Nothing is written if rendering or encoding fails.
pub fn save(
    scene: &Scene,
    path: impl AsRef<Path>,
    options: &ExportOptions,
    format: ExportFormat,
) -> Result<(), MeridianError> {
    let path = path.as_ref();
    let bytes = encode(scene, options, format)?;
    std::fs::write(path, bytes)?;
    log::info!("Scene exported to {}", path.display());
    Ok(())
}

fn flatten_over_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let flattened = Color::WHITE.blend(Color::rgba(r, g, b, a));
        image::Rgb([flattened.r(), flattened.g(), flattened.b()])
    })
}
