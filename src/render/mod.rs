//! # Rendering Module
//!
//! CPU rasterizer for scenes. The same pass backs the on-screen preview (at
//! the surface zoom) and export (always at zoom 1, so the output is exactly
//! the project's logical size).
//!
//! ## Modules
//!
//! - [`adjust`]: per-pixel filter passes (brightness, contrast, blur, ...)
//! - [`composite`]: affine sampling of objects onto the canvas
//! - [`text`]: bitmap text sprites
//!
//! ## Usage Example
//!
//! ```
//! use pixxel::geometry::Size;
//! use pixxel::render::{self, ElementCache, ExportFormat};
//! use pixxel::scene::Scene;
//!
//! let scene = Scene::new();
//! let raster = render::rasterize(&scene, &ElementCache::new(), Size::new(64.0, 32.0), 1.0);
//! assert_eq!(raster.dimensions(), (64, 32));
//! let png = render::encode(&raster, ExportFormat::Png).unwrap();
//! assert!(!png.is_empty());
//! ```

pub mod adjust;
pub mod composite;
pub mod text;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{PixxelError, Result};
use crate::geometry::Size;
use crate::scene::{ImageObject, ObjectKind, Scene, SceneObject};

/// Decoded image elements keyed by source URL.
pub type ElementCache = HashMap<String, Arc<RgbaImage>>;

/// Output encodings offered by export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    /// JPEG at quality 0.9.
    Jpeg,
    /// JPEG at quality 0.8.
    Jpeg80,
    /// WEBP. Encoded lossless.
    Webp,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Jpeg80,
        ExportFormat::Webp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Jpeg80 => "jpeg80",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Jpeg80 => "JPEG (80%)",
            ExportFormat::Webp => "WEBP",
        }
    }

    /// Nominal quality in `[0, 1]`.
    pub fn quality(&self) -> f32 {
        match self {
            ExportFormat::Png => 1.0,
            ExportFormat::Jpeg | ExportFormat::Webp => 0.9,
            ExportFormat::Jpeg80 => 0.8,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg | ExportFormat::Jpeg80 => "image/jpeg",
            ExportFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg | ExportFormat::Jpeg80 => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

/// Rasterize `scene` over a `logical` canvas at the given zoom.
///
/// Draw order: background colour, background image, then visible document
/// objects bottom to top. Helper objects are only drawn when `helpers` is
/// set (preview); export never shows them.
pub fn rasterize(scene: &Scene, elements: &ElementCache, logical: Size, zoom: f64) -> RgbaImage {
    rasterize_with(scene, elements, logical, zoom, false)
}

/// Like [`rasterize`] but also draws editor helpers such as the crop rectangle.
pub fn rasterize_preview(
    scene: &Scene,
    elements: &ElementCache,
    logical: Size,
    zoom: f64,
) -> RgbaImage {
    rasterize_with(scene, elements, logical, zoom, true)
}

fn rasterize_with(
    scene: &Scene,
    elements: &ElementCache,
    logical: Size,
    zoom: f64,
    helpers: bool,
) -> RgbaImage {
    let width = (logical.width * zoom).round().max(1.0) as u32;
    let height = (logical.height * zoom).round().max(1.0) as u32;
    let fill = scene
        .background
        .map(|c| Rgba(c.to_rgba()))
        .unwrap_or(Rgba([0, 0, 0, 0]));
    let mut canvas = RgbaImage::from_pixel(width, height, fill);

    if let Some(bg) = &scene.background_image {
        draw(&mut canvas, bg, elements, zoom);
    }
    for object in scene.objects() {
        if !object.visible || (object.helper.is_some() && !helpers) {
            continue;
        }
        draw(&mut canvas, object, elements, zoom);
    }
    canvas
}

fn draw(canvas: &mut RgbaImage, object: &SceneObject, elements: &ElementCache, zoom: f64) {
    match &object.kind {
        ObjectKind::Image(img) => {
            let Some(source) = elements.get(&img.src) else {
                tracing::debug!(src = %img.src, "Image element not loaded, skipping");
                return;
            };
            let sprite = prepare_image(source, img);
            composite::draw_sprite(canvas, object, &sprite, zoom);
        }
        ObjectKind::Text(text) => {
            let sprite = text::render_text(text);
            composite::draw_sprite(canvas, object, &sprite, zoom);
        }
        ObjectKind::Shape(shape) => {
            composite::draw_object(canvas, object, zoom, |local| {
                composite::shape_color(shape, local)
            });
        }
    }
}

/// Cut the visible region out of the source and run the filter chain.
pub fn prepare_image(source: &RgbaImage, img: &ImageObject) -> RgbaImage {
    let (sw, sh) = source.dimensions();
    if sw == 0 || sh == 0 {
        return source.clone();
    }
    let x = (img.crop_x.max(0.0).round() as u32).min(sw.saturating_sub(1));
    let y = (img.crop_y.max(0.0).round() as u32).min(sh.saturating_sub(1));
    let w = (img.width.round().max(1.0) as u32).min(sw - x).max(1);
    let h = (img.height.round().max(1.0) as u32).min(sh - y).max(1);

    let mut region = if x == 0 && y == 0 && w == sw && h == sh {
        source.clone()
    } else {
        imageops::crop_imm(source, x, y, w, h).to_image()
    };
    adjust::apply_filters(&mut region, &img.filters);
    region
}

/// Encode a raster in the requested export format.
pub fn encode(raster: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ExportFormat::Png => {
            raster.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
        ExportFormat::Jpeg | ExportFormat::Jpeg80 => {
            let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
            let quality = (format.quality() * 100.0).round() as u8;
            JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
        }
        ExportFormat::Webp => {
            raster.write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)?;
        }
    }
    if buf.is_empty() {
        return Err(PixxelError::Image(format!(
            "{} encoder produced no data",
            format.label()
        )));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::scene::{Color, Filter, HelperRole, ShapeObject, Transform};

    fn scene_with_image(src: &str) -> Scene {
        let mut scene = Scene::new();
        scene.add(
            ObjectKind::Image(ImageObject::new(src, 4.0, 4.0)),
            Transform::centered(Point::new(50.0, 50.0), 25.0),
        );
        scene
    }

    fn red_cache(src: &str) -> ElementCache {
        let mut cache = ElementCache::new();
        cache.insert(
            src.to_string(),
            Arc::new(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))),
        );
        cache
    }

    #[test]
    fn test_raster_is_logical_size_at_zoom_one() {
        let raster = rasterize(&Scene::new(), &ElementCache::new(), Size::new(1200.0, 600.0), 1.0);
        assert_eq!(raster.dimensions(), (1200, 600));
        assert_eq!(raster.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_preview_follows_zoom() {
        let raster = rasterize(&Scene::new(), &ElementCache::new(), Size::new(800.0, 600.0), 0.5);
        assert_eq!(raster.dimensions(), (400, 300));
    }

    #[test]
    fn test_image_is_drawn() {
        let raster = rasterize(
            &scene_with_image("a"),
            &red_cache("a"),
            Size::new(100.0, 100.0),
            1.0,
        );
        assert_eq!(raster.get_pixel(50, 50).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_element_is_skipped() {
        let raster = rasterize(
            &scene_with_image("a"),
            &ElementCache::new(),
            Size::new(100.0, 100.0),
            1.0,
        );
        assert_eq!(raster.get_pixel(50, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_filters_apply_to_image() {
        let mut scene = scene_with_image("a");
        let id = scene.objects()[0].id;
        if let Some(img) = scene.get_mut(id).and_then(|o| o.as_image_mut()) {
            img.filters.push(Filter::Brightness { brightness: -1.0 });
        }
        let raster = rasterize(&scene, &red_cache("a"), Size::new(100.0, 100.0), 1.0);
        assert_eq!(raster.get_pixel(50, 50).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_helpers_hidden_from_export() {
        let mut scene = Scene::new();
        let mut rect = ShapeObject::rect(100.0, 100.0);
        rect.fill = Some(Color::BLACK);
        let id = scene.add(ObjectKind::Shape(rect), Transform::default());
        if let Some(obj) = scene.get_mut(id) {
            obj.helper = Some(HelperRole::CropRect);
        }
        let logical = Size::new(10.0, 10.0);
        let cache = ElementCache::new();
        assert_eq!(rasterize(&scene, &cache, logical, 1.0).get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(
            rasterize_preview(&scene, &cache, logical, 1.0).get_pixel(5, 5).0,
            [0, 0, 0, 255]
        );
    }

    #[test]
    fn test_prepare_image_crops_region() {
        let mut source = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        source.put_pixel(6, 7, Rgba([9, 9, 9, 255]));
        let mut img = ImageObject::new("a", 4.0, 3.0);
        img.crop_x = 5.0;
        img.crop_y = 5.0;
        let region = prepare_image(&source, &img);
        assert_eq!(region.dimensions(), (4, 3));
        assert_eq!(region.get_pixel(1, 2).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_encode_formats() {
        let raster = RgbaImage::from_pixel(8, 8, Rgba([10, 200, 30, 255]));
        for format in ExportFormat::ALL {
            let bytes = encode(&raster, format).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (8, 8), "{:?}", format);
        }
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::from_name("JPEG80"), Some(ExportFormat::Jpeg80));
        assert_eq!(ExportFormat::from_name("gif"), None);
        assert_eq!(ExportFormat::Webp.mime_type(), "image/webp");
    }
}
