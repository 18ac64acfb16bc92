//! Text rasterization with the Spleen bitmap font.
//!
//! Glyphs come from the 12×24 Spleen face and are scaled nearest-neighbour
//! to the cell size implied by the font size (`font_size * GLYPH_ASPECT` by
//! `font_size`). Family names are recorded but every family renders with
//! the bundled face.

use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};

use crate::scene::object::GLYPH_ASPECT;
use crate::scene::{TextAlign, TextObject};

const SRC_W: usize = 12;
const SRC_H: usize = 24;

/// 12×24 on/off bitmap for one character. Unknown characters draw a box.
fn glyph_bitmap(ch: char) -> Vec<bool> {
    let mut bitmap = vec![false; SRC_W * SRC_H];
    if ch == ' ' {
        return bitmap;
    }
    let Ok(mut font) = PSF2Font::new(FONT_12X24) else {
        draw_box(&mut bitmap);
        return bitmap;
    };
    let utf8 = ch.to_string();
    if let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) {
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if row_y < SRC_H && col_x < SRC_W {
                    bitmap[row_y * SRC_W + col_x] = on;
                }
            }
        }
    } else {
        draw_box(&mut bitmap);
    }
    bitmap
}

fn draw_box(bitmap: &mut [bool]) {
    for x in 1..SRC_W - 1 {
        bitmap[2 * SRC_W + x] = true;
        bitmap[(SRC_H - 3) * SRC_W + x] = true;
    }
    for y in 2..SRC_H - 2 {
        bitmap[y * SRC_W + 1] = true;
        bitmap[y * SRC_W + SRC_W - 2] = true;
    }
}

/// Render a text object to a sprite of its unscaled measured size.
pub fn render_text(text: &TextObject) -> RgbaImage {
    let size = text.measure();
    let width = size.width.round().max(1.0) as u32;
    let height = size.height.round().max(1.0) as u32;
    let mut sprite = RgbaImage::new(width, height);

    let cell_w = (text.font_size * GLYPH_ASPECT).max(1.0);
    let cell_h = text.font_size.max(1.0);
    let color = Rgba(text.fill.to_rgba());

    for (line_idx, line) in text.text.split('\n').enumerate() {
        let line_width = line.chars().count() as f64 * cell_w;
        let x0 = match text.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (size.width - line_width) / 2.0,
            TextAlign::Right => size.width - line_width,
        };
        let y0 = line_idx as f64 * cell_h;

        for (char_idx, ch) in line.chars().enumerate() {
            let bitmap = glyph_bitmap(ch);
            let cx = x0 + char_idx as f64 * cell_w;
            blit_glyph(&mut sprite, &bitmap, cx, y0, cell_w, cell_h, text, color);
        }

        if text.underline && !line.is_empty() {
            let thickness = (cell_h / 16.0).ceil().max(1.0) as u32;
            let y_start = (y0 + cell_h * 0.92).round() as u32;
            for y in y_start..(y_start + thickness).min(height) {
                let x_start = x0.max(0.0).round() as u32;
                let x_end = ((x0 + line_width).round() as u32).min(width);
                for x in x_start..x_end {
                    sprite.put_pixel(x, y, color);
                }
            }
        }
    }

    sprite
}

#[allow(clippy::too_many_arguments)]
fn blit_glyph(
    sprite: &mut RgbaImage,
    bitmap: &[bool],
    cx: f64,
    cy: f64,
    cell_w: f64,
    cell_h: f64,
    text: &TextObject,
    color: Rgba<u8>,
) {
    let (w, h) = sprite.dimensions();
    let embolden = if text.bold { (cell_w / SRC_W as f64).ceil().max(1.0) as i64 } else { 0 };

    for dy in 0..cell_h.ceil() as i64 {
        let src_y = ((dy as f64 / cell_h) * SRC_H as f64) as usize;
        if src_y >= SRC_H {
            continue;
        }
        // Italic: shift rows right towards the top of the cell.
        let shear = if text.italic {
            ((cell_h - dy as f64) * 0.2).round() as i64
        } else {
            0
        };
        for dx in 0..cell_w.ceil() as i64 {
            let src_x = ((dx as f64 / cell_w) * SRC_W as f64) as usize;
            if src_x >= SRC_W || !bitmap[src_y * SRC_W + src_x] {
                continue;
            }
            for extra in 0..=embolden {
                let x = cx.round() as i64 + dx + shear + extra;
                let y = cy.round() as i64 + dy;
                if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                    sprite.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}
