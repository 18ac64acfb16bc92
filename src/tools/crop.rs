//! Interactive crop.
//!
//! Entering crop mode freezes the target image and puts a dashed crop
//! rectangle over it. Confirming replaces the image with one that shows only
//! the region under the rectangle; cancelling restores the image exactly.
//!
//! All crop math runs in logical scene coordinates, the same space every
//! other tool uses, so the result does not depend on the display zoom.

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::scene::{
    Color, HelperRole, ImageObject, ObjectId, ObjectKind, SceneObject, ShapeObject, Transform,
};
use crate::session::{Applied, EditorSession, commit};

/// Crop rectangle inset from the image bounds, per side.
const INSET: f64 = 0.1;
/// Crop rectangle size relative to the image bounds.
const COVER: f64 = 0.8;

/// Aspect choices offered for the crop rectangle (`None` is freeform).
pub const ASPECT_RATIOS: [(&str, Option<f64>); 5] = [
    ("Freeform", None),
    ("Square", Some(1.0)),
    ("Widescreen", Some(16.0 / 9.0)),
    ("Portrait", Some(4.0 / 5.0)),
    ("Story", Some(9.0 / 16.0)),
];

/// Image properties captured when crop mode starts.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalProps {
    pub transform: Transform,
    pub selectable: bool,
    pub evented: bool,
}

/// Crop mode bookkeeping held by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CropState {
    pub image: ObjectId,
    pub rect: ObjectId,
    pub original: OriginalProps,
    pub ratio: Option<f64>,
}

fn crop_rect_object(bounds: Rect) -> SceneObject {
    let mut shape = ShapeObject::rect(bounds.width * COVER, bounds.height * COVER);
    shape.stroke = Some(Color::CROP_ACCENT);
    shape.stroke_width = 2.0;
    shape.stroke_dash = vec![5.0, 5.0];
    let mut object = SceneObject::new(
        ObjectId(0),
        ObjectKind::Shape(shape),
        Transform {
            left: bounds.left + bounds.width * INSET,
            top: bounds.top + bounds.height * INSET,
            ..Default::default()
        },
    );
    object.helper = Some(HelperRole::CropRect);
    object
}

/// Enter crop mode on the active image (or the first image).
///
/// Returns the crop rectangle's id. Calling it while already cropping
/// returns the existing rectangle.
pub async fn begin(session: &mut EditorSession) -> Result<Applied<ObjectId>> {
    let surface = session.surface()?;
    if let Some(state) = &session.crop {
        return Ok(Applied::Done(state.rect));
    }
    let image = super::main_image(&surface).await?;

    let applied = commit(&surface, |s| {
        let stale: Vec<ObjectId> = s.scene().crop_rects().map(|o| o.id).collect();
        for id in stale {
            s.remove_helper(id);
        }

        let target = s.scene().get(image)?;
        let original = OriginalProps {
            transform: target.transform,
            selectable: target.selectable,
            evented: target.evented,
        };
        let bounds = target.bounding_rect();
        s.modify_quiet(image, |o| {
            o.selectable = false;
            o.evented = false;
        });
        let rect = s.insert_helper(crop_rect_object(bounds));
        s.set_active(Some(rect));
        Some((rect, original))
    })
    .await;

    match applied {
        Applied::Done(Some((rect, original))) => {
            session.crop = Some(CropState {
                image,
                rect,
                original,
                ratio: None,
            });
            Ok(Applied::Done(rect))
        }
        Applied::Done(None) | Applied::Stale => Ok(Applied::Stale),
    }
}

/// Fix the crop rectangle's aspect (`width / height`), or free it.
pub async fn set_aspect(session: &mut EditorSession, ratio: Option<f64>) -> Result<()> {
    let surface = session.surface()?;
    let Some(state) = session.crop.as_mut() else {
        return Ok(());
    };
    state.ratio = ratio.filter(|r| *r > 0.0);
    let (rect, ratio) = (state.rect, state.ratio);
    if let Some(ratio) = ratio {
        commit(&surface, |s| s.modify_helper(rect, |o| lock_aspect(o, ratio))).await;
    }
    Ok(())
}

fn lock_aspect(rect: &mut SceneObject, ratio: f64) {
    let (scale_x, scale_y) = (rect.transform.scale_x, rect.transform.scale_y);
    if let ObjectKind::Shape(shape) = &mut rect.kind
        && scale_y != 0.0
    {
        let height = shape.width * scale_x / ratio;
        shape.height = height / scale_y;
    }
}

/// Move or resize the crop rectangle to `bounds` (logical coordinates).
///
/// A fixed aspect wins over the requested height.
pub async fn set_region(session: &mut EditorSession, bounds: Rect) -> Result<()> {
    let surface = session.surface()?;
    let Some(state) = &session.crop else {
        return Ok(());
    };
    let (rect, ratio) = (state.rect, state.ratio);
    commit(&surface, |s| {
        s.modify_helper(rect, |o| {
            o.transform = Transform {
                left: bounds.left,
                top: bounds.top,
                ..Default::default()
            };
            if let ObjectKind::Shape(shape) = &mut o.kind {
                shape.width = bounds.width.max(1.0);
                shape.height = bounds.height.max(1.0);
            }
            if let Some(ratio) = ratio {
                lock_aspect(o, ratio);
            }
        })
    })
    .await;
    Ok(())
}

/// Region of `image` under `crop`, in the image's source pixels.
///
/// The crop corners are mapped through the image's inverse transform and
/// their bounds are clipped to the image, so overhanging or rotated crop
/// rectangles keep only the pixels actually covered. The result is relative
/// to the image's current visible region; `None` when nothing overlaps.
pub fn source_region(image: &SceneObject, crop: Rect) -> Option<Rect> {
    let corners = [
        Point::new(crop.left, crop.top),
        Point::new(crop.right(), crop.top),
        Point::new(crop.right(), crop.bottom()),
        Point::new(crop.left, crop.bottom()),
    ];
    let mut local = Vec::with_capacity(corners.len());
    for corner in corners {
        local.push(image.scene_to_local(corner)?);
    }
    let size = image.intrinsic_size();
    Rect::bounding(&local).intersection(&Rect::new(0.0, 0.0, size.width, size.height))
}

fn cropped_image(image: &SceneObject, src: &ImageObject, crop: Rect) -> Option<SceneObject> {
    let region = source_region(image, crop)?;
    // The kept pixels stay where they were drawn.
    let center = image.local_to_scene(region.center());
    let mut cropped = ImageObject::new(src.src.clone(), region.width, region.height);
    cropped.crop_x = src.crop_x + region.left;
    cropped.crop_y = src.crop_y + region.top;
    cropped.filters = src.filters.clone();
    Some(SceneObject::new(
        ObjectId(0),
        ObjectKind::Image(cropped),
        Transform {
            scale_x: image.transform.scale_x,
            scale_y: image.transform.scale_y,
            angle: image.transform.angle,
            ..Transform::centered(center, 1.0)
        },
    ))
}

/// Apply the crop. Without an active crop rectangle this does nothing and
/// returns `Done(None)`.
pub async fn confirm(session: &mut EditorSession) -> Result<Applied<Option<ObjectId>>> {
    let surface = session.surface()?;
    let Some(state) = session.crop.take() else {
        return Ok(Applied::Done(None));
    };

    let applied = commit(&surface, |s| {
        let rect = s.remove_helper(state.rect)?;
        let crop = rect.bounding_rect();
        let image = s.scene().get(state.image)?.clone();
        let src = image.as_image()?;
        let Some(replacement) = cropped_image(&image, src, crop) else {
            tracing::warn!("Crop region does not overlap the image");
            s.modify_quiet(state.image, |o| {
                o.selectable = state.original.selectable;
                o.evented = state.original.evented;
            });
            return None;
        };
        let id = s.replace(state.image, replacement).ok()?;
        s.set_active(Some(id));
        Some(id)
    })
    .await;

    match applied {
        Applied::Done(id) => {
            if let Some(id) = id {
                tracing::info!(object = id.0, "Crop applied");
            }
            Ok(Applied::Done(id))
        }
        Applied::Stale => Ok(Applied::Stale),
    }
}

/// Leave crop mode, restoring the image as it was.
pub async fn cancel(session: &mut EditorSession) -> Result<()> {
    let Some(state) = session.crop.take() else {
        return Ok(());
    };
    let surface = session.surface()?;
    commit(&surface, |s| {
        let stale: Vec<ObjectId> = s.scene().crop_rects().map(|o| o.id).collect();
        for id in stale {
            s.remove_helper(id);
        }
        let restored = s.modify_quiet(state.image, |o| {
            o.transform = state.original.transform;
            o.selectable = state.original.selectable;
            o.evented = state.original.evented;
        });
        if restored.is_some() {
            s.set_active(Some(state.image));
        }
    })
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_at(bounds: Rect, src_w: f64, src_h: f64) -> SceneObject {
        SceneObject::new(
            ObjectId(1),
            ObjectKind::Image(ImageObject::new("x", src_w, src_h)),
            Transform {
                left: bounds.left,
                top: bounds.top,
                scale_x: bounds.width / src_w,
                scale_y: bounds.height / src_h,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_crop_rect_is_inset() {
        let rect = crop_rect_object(Rect::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(rect.bounding_rect(), Rect::new(80.0, 60.0, 640.0, 480.0));
        assert!(rect.is_crop_rect());
    }

    #[test]
    fn test_source_region_in_source_pixels() {
        // 400x300 source drawn at 2x.
        let image = image_at(Rect::new(0.0, 0.0, 800.0, 600.0), 400.0, 300.0);
        let region = source_region(&image, Rect::new(80.0, 60.0, 640.0, 480.0)).unwrap();
        assert_eq!(region, Rect::new(40.0, 30.0, 320.0, 240.0));
    }

    #[test]
    fn test_source_region_clamps_to_image() {
        let image = image_at(Rect::new(100.0, 100.0, 200.0, 200.0), 200.0, 200.0);
        let region = source_region(&image, Rect::new(50.0, 250.0, 400.0, 400.0)).unwrap();
        assert_eq!(region, Rect::new(0.0, 150.0, 200.0, 50.0));
        assert!(source_region(&image, Rect::new(400.0, 400.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_cropped_image_centres_on_rect_and_accumulates_offset() {
        let image = image_at(Rect::new(0.0, 0.0, 800.0, 600.0), 400.0, 300.0);
        let mut src = image.as_image().unwrap().clone();
        src.crop_x = 10.0;
        let crop = Rect::new(80.0, 60.0, 640.0, 480.0);
        let out = cropped_image(&image, &src, crop).unwrap();
        assert_eq!(out.center(), crop.center());
        let img = out.as_image().unwrap();
        assert_eq!((img.crop_x, img.crop_y), (50.0, 30.0));
        assert_eq!(out.bounding_rect(), crop);
    }

    #[test]
    fn test_crop_overhanging_left_edge_keeps_covered_pixels() {
        let image = image_at(Rect::new(100.0, 100.0, 200.0, 200.0), 200.0, 200.0);
        let crop = Rect::new(50.0, 100.0, 100.0, 100.0);
        assert_eq!(
            source_region(&image, crop).unwrap(),
            Rect::new(0.0, 0.0, 50.0, 100.0)
        );

        let src = image.as_image().unwrap().clone();
        let out = cropped_image(&image, &src, crop).unwrap();
        assert_eq!(out.bounding_rect(), Rect::new(100.0, 100.0, 50.0, 100.0));
        let img = out.as_image().unwrap();
        assert_eq!((img.crop_x, img.crop_y, img.width, img.height), (0.0, 0.0, 50.0, 100.0));
    }

    #[test]
    fn test_crop_overhanging_top_left_corner_at_scale() {
        // 100x100 source drawn at 2x from (40, 40).
        let image = image_at(Rect::new(40.0, 40.0, 200.0, 200.0), 100.0, 100.0);
        let crop = Rect::new(0.0, 20.0, 140.0, 120.0);
        assert_eq!(
            source_region(&image, crop).unwrap(),
            Rect::new(0.0, 0.0, 50.0, 50.0)
        );
        let src = image.as_image().unwrap().clone();
        let out = cropped_image(&image, &src, crop).unwrap();
        assert_eq!(out.bounding_rect(), Rect::new(40.0, 40.0, 100.0, 100.0));
    }

    #[test]
    fn test_crop_on_rotated_image_uses_local_frame() {
        // 200x100 source centred at (300, 300) and turned a quarter, so it
        // covers (250..350, 200..400) on the canvas.
        let image = SceneObject::new(
            ObjectId(1),
            ObjectKind::Image(ImageObject::new("x", 200.0, 100.0)),
            Transform {
                angle: 90.0,
                ..Transform::centered(Point::new(300.0, 300.0), 1.0)
            },
        );
        let bounds = image.bounding_rect();
        assert!((bounds.left - 250.0).abs() < 1e-9 && (bounds.top - 200.0).abs() < 1e-9);

        // Bottom half of the canvas footprint is the far half of the source.
        let crop = Rect::new(250.0, 300.0, 100.0, 100.0);
        let region = source_region(&image, crop).unwrap();
        assert!((region.left - 100.0).abs() < 1e-9);
        assert!(region.top.abs() < 1e-9);
        assert!((region.width - 100.0).abs() < 1e-9);
        assert!((region.height - 100.0).abs() < 1e-9);

        let src = image.as_image().unwrap().clone();
        let out = cropped_image(&image, &src, crop).unwrap();
        assert_eq!(out.transform.angle, 90.0);
        let kept = out.bounding_rect();
        assert!((kept.left - 250.0).abs() < 1e-9);
        assert!((kept.top - 300.0).abs() < 1e-9);
        assert!((kept.width - 100.0).abs() < 1e-9);
        assert!((kept.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_lock_aspect_sets_height() {
        let mut rect = crop_rect_object(Rect::new(0.0, 0.0, 1000.0, 1000.0));
        lock_aspect(&mut rect, 16.0 / 9.0);
        let size = rect.display_size();
        assert!((size.width / size.height - 16.0 / 9.0).abs() < 1e-9);
    }
}
