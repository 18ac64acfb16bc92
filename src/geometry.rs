//! Geometry primitives and the logical ↔ display mapping.
//!
//! All object coordinates live in the project's logical space. The display
//! scale is derived from the container size at view time and never written
//! back into object coordinates.

use serde::{Deserialize, Serialize};

/// Width/height pair in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height; `None` for degenerate sizes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.width > 0.0 && self.height > 0.0).then(|| self.width / self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Smallest rectangle containing every point.
    pub fn bounding(points: &[Point]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if points.is_empty() {
            return Self::default();
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Overlap of two rectangles, or `None` when they share no area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

/// Largest scale ≤ 1 at which `logical` fits inside `container`.
///
/// Preserves aspect ratio and never upscales. Degenerate logical sizes map
/// to 1; an empty container maps to 0.
pub fn viewport_scale(logical: Size, container: Size) -> f64 {
    if logical.width <= 0.0 || logical.height <= 0.0 {
        return 1.0;
    }
    let scale_x = container.width / logical.width;
    let scale_y = container.height / logical.height;
    scale_x.min(scale_y).min(1.0).max(0.0)
}

/// Scale at which `content` fits entirely inside `target`.
pub fn contain_scale(content: Size, target: Size) -> f64 {
    if content.width <= 0.0 || content.height <= 0.0 {
        return 1.0;
    }
    (target.width / content.width).min(target.height / content.height)
}

/// Scale at which `content` fully covers `target`.
pub fn cover_scale(content: Size, target: Size) -> f64 {
    if content.width <= 0.0 || content.height <= 0.0 {
        return 1.0;
    }
    (target.width / content.width).max(target.height / content.height)
}

/// Display mapping for one logical canvas inside one container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFit {
    pub scale: f64,
    /// On-screen width in whole pixels.
    pub pixel_width: u32,
    /// On-screen height in whole pixels.
    pub pixel_height: u32,
    /// Multiplier applied to logical coordinates when drawing.
    pub zoom: f64,
}

impl ViewportFit {
    pub fn compute(logical: Size, container: Size) -> Self {
        let scale = viewport_scale(logical, container);
        let pixel_width = (logical.width * scale).round().max(0.0) as u32;
        let pixel_height = (logical.height * scale).round().max(0.0) as u32;
        let zoom = if logical.width > 0.0 {
            pixel_width as f64 / logical.width
        } else {
            1.0
        };
        Self {
            scale,
            pixel_width,
            pixel_height,
            zoom,
        }
    }
}
