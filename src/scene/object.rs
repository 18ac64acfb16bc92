//! Drawable objects and their transforms.

use serde::{Deserialize, Serialize};

use super::color::Color;
use super::filter::Filter;
use crate::geometry::{Point, Rect, Size};

/// Stable identifier of an object within one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Position, scale and rotation of an object in logical coordinates.
///
/// `left`/`top` locate the origin point; the origin is a reference point on
/// the object's own box chosen by `origin_x`/`origin_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Clockwise rotation in degrees.
    pub angle: f64,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
        }
    }
}

impl Transform {
    /// Centre-origin transform at `at` with a uniform scale.
    pub fn centered(at: Point, scale: f64) -> Self {
        Self {
            left: at.x,
            top: at.y,
            scale_x: scale,
            scale_y: scale,
            angle: 0.0,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    pub src: String,
    /// Width of the visible region in source pixels.
    pub width: f64,
    /// Height of the visible region in source pixels.
    pub height: f64,
    #[serde(default)]
    pub crop_x: f64,
    #[serde(default)]
    pub crop_y: f64,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl ImageObject {
    pub fn new(src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            src: src.into(),
            width,
            height,
            crop_x: 0.0,
            crop_y: 0.0,
            filters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Glyph cell width relative to the font size for the bundled bitmap font.
pub const GLYPH_ASPECT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextObject {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub fill: Color,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl TextObject {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: "Arial".to_string(),
            font_size: 48.0,
            fill: Color::WHITE,
            bold: false,
            italic: false,
            underline: false,
            text_align: TextAlign::Left,
        }
    }

    /// Unscaled box of the laid-out text.
    pub fn measure(&self) -> Size {
        let lines: Vec<&str> = self.text.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Size::new(
            longest as f64 * self.font_size * GLYPH_ASPECT,
            lines.len() as f64 * self.font_size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Ellipse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeObject {
    pub shape: ShapeKind,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub stroke: Option<Color>,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_dash: Vec<f64>,
}

impl ShapeObject {
    pub fn rect(width: f64, height: f64) -> Self {
        Self {
            shape: ShapeKind::Rect,
            width,
            height,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            stroke_dash: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Image(ImageObject),
    Text(TextObject),
    Shape(ShapeObject),
}

/// Discriminant of [`ObjectKind`], used for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Image,
    Text,
    Shape,
}

/// Editor-only helpers that live in the scene temporarily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperRole {
    CropRect,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: ObjectId,
    #[serde(flatten)]
    pub transform: Transform,
    pub kind: ObjectKind,
    #[serde(default = "default_true")]
    pub selectable: bool,
    #[serde(default = "default_true")]
    pub evented: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Helpers are never serialized.
    #[serde(skip)]
    pub helper: Option<HelperRole>,
}

impl SceneObject {
    pub fn new(id: ObjectId, kind: ObjectKind, transform: Transform) -> Self {
        Self {
            id,
            transform,
            kind,
            selectable: true,
            evented: true,
            visible: true,
            helper: None,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self.kind {
            ObjectKind::Image(_) => ObjectType::Image,
            ObjectKind::Text(_) => ObjectType::Text,
            ObjectKind::Shape(_) => ObjectType::Shape,
        }
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match &self.kind {
            ObjectKind::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageObject> {
        match &mut self.kind {
            ObjectKind::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextObject> {
        match &mut self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_crop_rect(&self) -> bool {
        self.helper == Some(HelperRole::CropRect)
    }

    /// Unscaled size of the object's own box.
    pub fn intrinsic_size(&self) -> Size {
        match &self.kind {
            ObjectKind::Image(img) => Size::new(img.width, img.height),
            ObjectKind::Text(text) => text.measure(),
            ObjectKind::Shape(shape) => Size::new(shape.width, shape.height),
        }
    }

    /// Size after scaling, before rotation.
    pub fn display_size(&self) -> Size {
        let s = self.intrinsic_size();
        Size::new(
            s.width * self.transform.scale_x.abs(),
            s.height * self.transform.scale_y.abs(),
        )
    }

    /// Uniformly scale so the displayed width equals `width`.
    pub fn scale_to_width(&mut self, width: f64) {
        let intrinsic = self.intrinsic_size().width;
        if intrinsic > 0.0 {
            let scale = width / intrinsic;
            self.transform.scale_x = scale;
            self.transform.scale_y = scale;
        }
    }

    /// The origin point in unscaled local coordinates (top-left is 0,0).
    fn origin_local(&self) -> Point {
        let size = self.intrinsic_size();
        let x = match self.transform.origin_x {
            OriginX::Left => 0.0,
            OriginX::Center => size.width / 2.0,
            OriginX::Right => size.width,
        };
        let y = match self.transform.origin_y {
            OriginY::Top => 0.0,
            OriginY::Center => size.height / 2.0,
            OriginY::Bottom => size.height,
        };
        Point::new(x, y)
    }

    /// Map a point in unscaled local coordinates to scene coordinates.
    pub fn local_to_scene(&self, p: Point) -> Point {
        let t = &self.transform;
        let origin = self.origin_local();
        let dx = (p.x - origin.x) * t.scale_x;
        let dy = (p.y - origin.y) * t.scale_y;
        let (sin, cos) = t.angle.to_radians().sin_cos();
        Point::new(t.left + dx * cos - dy * sin, t.top + dx * sin + dy * cos)
    }

    /// Inverse of [`SceneObject::local_to_scene`]. `None` for zero scale.
    pub fn scene_to_local(&self, p: Point) -> Option<Point> {
        let t = &self.transform;
        if t.scale_x == 0.0 || t.scale_y == 0.0 {
            return None;
        }
        let origin = self.origin_local();
        let (sin, cos) = t.angle.to_radians().sin_cos();
        let dx = p.x - t.left;
        let dy = p.y - t.top;
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        Some(Point::new(
            rx / t.scale_x + origin.x,
            ry / t.scale_y + origin.y,
        ))
    }

    /// Axis-aligned bounds in scene coordinates.
    pub fn bounding_rect(&self) -> Rect {
        let size = self.intrinsic_size();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size.width, 0.0),
            Point::new(size.width, size.height),
            Point::new(0.0, size.height),
        ]
        .map(|c| self.local_to_scene(c));
        Rect::bounding(&corners)
    }

    /// Scene position of the object's centre.
    pub fn center(&self) -> Point {
        let size = self.intrinsic_size();
        self.local_to_scene(Point::new(size.width / 2.0, size.height / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: f64, h: f64, transform: Transform) -> SceneObject {
        SceneObject::new(
            ObjectId(1),
            ObjectKind::Image(ImageObject::new("x", w, h)),
            transform,
        )
    }

    #[test]
    fn test_centered_bounds() {
        let obj = image(400.0, 300.0, Transform::centered(Point::new(400.0, 300.0), 2.0));
        assert_eq!(obj.bounding_rect(), Rect::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(obj.center(), Point::new(400.0, 300.0));
    }

    #[test]
    fn test_top_left_origin_bounds() {
        let obj = image(
            100.0,
            50.0,
            Transform {
                left: 10.0,
                top: 20.0,
                ..Default::default()
            },
        );
        assert_eq!(obj.bounding_rect(), Rect::new(10.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn test_rotated_bounds_swap_axes() {
        let mut t = Transform::centered(Point::new(0.0, 0.0), 1.0);
        t.angle = 90.0;
        let r = image(100.0, 50.0, t).bounding_rect();
        assert!((r.width - 50.0).abs() < 1e-9);
        assert!((r.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_scene_local_inverse() {
        let mut t = Transform::centered(Point::new(40.0, 70.0), 1.5);
        t.angle = 33.0;
        let obj = image(80.0, 60.0, t);
        let local = Point::new(12.0, 45.0);
        let back = obj.scene_to_local(obj.local_to_scene(local)).unwrap();
        assert!((back.x - local.x).abs() < 1e-9);
        assert!((back.y - local.y).abs() < 1e-9);
    }

    #[test]
    fn test_scale_to_width() {
        let mut obj = image(400.0, 300.0, Transform::default());
        obj.scale_to_width(800.0);
        assert_eq!(obj.transform.scale_x, 2.0);
        assert_eq!(obj.transform.scale_y, 2.0);
    }

    #[test]
    fn test_text_measure() {
        let text = TextObject {
            font_size: 20.0,
            ..TextObject::new("ab\nabcd")
        };
        assert_eq!(text.measure(), Size::new(40.0, 40.0));
    }
}
