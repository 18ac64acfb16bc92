//! Affine compositing of scene objects onto a raster.
//!
//! Every destination pixel inside the object's bounds is mapped back into
//! the object's local box and sampled there, so scale, rotation and origin
//! are handled uniformly for images, text and shapes.

use image::RgbaImage;
use rayon::prelude::*;

use crate::geometry::Point;
use crate::scene::{SceneObject, ShapeKind, ShapeObject};

/// Straight-alpha "source over" blend of `src` onto a 4-byte pixel.
#[inline]
pub fn blend_over(dst: &mut [u8], src: [f32; 4]) {
    let sa = (src[3] / 255.0).clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Bilinear sample at continuous sprite coordinates (pixel centres at +0.5).
pub fn sample_bilinear(sprite: &RgbaImage, x: f64, y: f64) -> [f32; 4] {
    let (w, h) = sprite.dimensions();
    if w == 0 || h == 0 {
        return [0.0; 4];
    }
    let fx = (x - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (y - 0.5).clamp(0.0, (h - 1) as f64);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = (fx - x0 as f64) as f32;
    let ty = (fy - y0 as f64) as f32;

    let p00 = sprite.get_pixel(x0, y0).0;
    let p10 = sprite.get_pixel(x1, y0).0;
    let p01 = sprite.get_pixel(x0, y1).0;
    let p11 = sprite.get_pixel(x1, y1).0;

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = p00[c] as f32 * (1.0 - tx) + p10[c] as f32 * tx;
        let bottom = p01[c] as f32 * (1.0 - tx) + p11[c] as f32 * tx;
        out[c] = top * (1.0 - ty) + bottom * ty;
    }
    out
}

/// Draw `object` onto `target`, sampling colours in local coordinates.
///
/// `zoom` maps logical units to target pixels (1.0 for export).
pub fn draw_object<F>(target: &mut RgbaImage, object: &SceneObject, zoom: f64, sample: F)
where
    F: Fn(Point) -> Option<[f32; 4]> + Sync,
{
    if zoom <= 0.0 {
        return;
    }
    let (tw, th) = target.dimensions();
    let bounds = object.bounding_rect();
    let x_start = ((bounds.left * zoom).floor().max(0.0) as u32).min(tw);
    let x_end = ((bounds.right() * zoom).ceil().max(0.0) as u32).min(tw);
    let y_start = ((bounds.top * zoom).floor().max(0.0) as u32).min(th);
    let y_end = ((bounds.bottom() * zoom).ceil().max(0.0) as u32).min(th);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let size = object.intrinsic_size();
    let row_len = tw as usize * 4;
    let raw: &mut [u8] = &mut **target;

    raw.par_chunks_mut(row_len)
        .enumerate()
        .skip(y_start as usize)
        .take((y_end - y_start) as usize)
        .for_each(|(y, row)| {
            for x in x_start..x_end {
                let scene = Point::new((x as f64 + 0.5) / zoom, (y as f64 + 0.5) / zoom);
                let Some(local) = object.scene_to_local(scene) else {
                    continue;
                };
                if local.x < 0.0 || local.y < 0.0 || local.x >= size.width || local.y >= size.height {
                    continue;
                }
                if let Some(color) = sample(local) {
                    let i = x as usize * 4;
                    blend_over(&mut row[i..i + 4], color);
                }
            }
        });
}

/// Draw a pre-rendered sprite stretched over the object's local box.
pub fn draw_sprite(target: &mut RgbaImage, object: &SceneObject, sprite: &RgbaImage, zoom: f64) {
    let size = object.intrinsic_size();
    if size.width <= 0.0 || size.height <= 0.0 {
        return;
    }
    let sx = sprite.width() as f64 / size.width;
    let sy = sprite.height() as f64 / size.height;
    draw_object(target, object, zoom, |local| {
        Some(sample_bilinear(sprite, local.x * sx, local.y * sy))
    });
}

fn dash_on(dash: &[f64], distance: f64) -> bool {
    let period: f64 = dash.iter().sum();
    if dash.is_empty() || period <= 0.0 {
        return true;
    }
    let mut d = distance.rem_euclid(period);
    for (i, seg) in dash.iter().enumerate() {
        if d < *seg {
            return i % 2 == 0;
        }
        d -= seg;
    }
    true
}

/// Colour of a shape at a local point: stroke band first, then fill.
pub fn shape_color(shape: &ShapeObject, local: Point) -> Option<[f32; 4]> {
    let w = shape.width;
    let h = shape.height;
    let sw = shape.stroke_width.max(0.0);

    let (inside, edge_distance, perimeter_pos) = match shape.shape {
        ShapeKind::Rect => {
            let d = local.x.min(local.y).min(w - local.x).min(h - local.y);
            // Position along the outline for dash patterns.
            let pos = if local.y.min(h - local.y) <= local.x.min(w - local.x) {
                local.x
            } else {
                local.y
            };
            (d >= 0.0, d, pos)
        }
        ShapeKind::Ellipse => {
            let rx = w / 2.0;
            let ry = h / 2.0;
            if rx <= 0.0 || ry <= 0.0 {
                return None;
            }
            let nx = (local.x - rx) / rx;
            let ny = (local.y - ry) / ry;
            let r = (nx * nx + ny * ny).sqrt();
            let d = (1.0 - r) * rx.min(ry);
            let angle = ny.atan2(nx);
            (r <= 1.0, d, angle * rx.max(ry))
        }
    };
    if !inside {
        return None;
    }
    if let Some(stroke) = shape.stroke
        && sw > 0.0
        && edge_distance < sw
        && dash_on(&shape.stroke_dash, perimeter_pos)
    {
        let c = stroke.to_rgba();
        return Some([c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32]);
    }
    shape.fill.map(|fill| {
        let c = fill.to_rgba();
        [c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32]
    })
}
