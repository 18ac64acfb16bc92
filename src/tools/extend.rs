//! Generative image extension.
//!
//! The transformation host pads the image on one side and fills the new
//! area. The original pixels stay anchored to the opposite edge.

use crate::error::{PixxelError, Result};
use crate::geometry::{Size, contain_scale};
use crate::remote::transform::{self, Direction};
use crate::scene::{ImageObject, ObjectId, ObjectKind, SceneObject, Transform};
use crate::session::{Applied, EditorSession, ToolId, commit};
use crate::store::ProjectPatch;

pub const EXTEND_MIN: u32 = 50;
pub const EXTEND_MAX: u32 = 500;
pub const EXTEND_STEP: u32 = 25;
pub const EXTEND_DEFAULT: u32 = 200;

/// Snap `amount` onto the slider: clamped and rounded to the nearest step.
pub fn snap_amount(amount: u32) -> u32 {
    let clamped = amount.clamp(EXTEND_MIN, EXTEND_MAX);
    let steps = ((clamped - EXTEND_MIN) as f64 / EXTEND_STEP as f64).round() as u32;
    EXTEND_MIN + steps * EXTEND_STEP
}

/// Size of the extended image: `display` grown by `amount` along `direction`.
pub fn new_dimensions(display: Size, direction: Direction, amount: u32) -> (u32, u32) {
    let width = display.width.round() as u32;
    let height = display.height.round() as u32;
    if direction.is_horizontal() {
        (width + amount, height)
    } else {
        (width, height + amount)
    }
}

/// Extend the main image towards `direction` by `amount` logical pixels.
///
/// Images whose background was already removed or replaced are refused:
/// the host cannot fill around a cut-out.
pub async fn extend(
    session: &mut EditorSession,
    direction: Direction,
    amount: u32,
) -> Result<Applied<ObjectId>> {
    super::require_access(session, ToolId::AiExtender)?;
    let surface = session.surface()?;
    let logical = session.logical_size()?;
    let image_id = super::main_image(&surface).await?;
    let amount = snap_amount(amount);

    let (src, display) = {
        let guard = surface.lock().await;
        let object = guard
            .scene()
            .get(image_id)
            .ok_or_else(|| PixxelError::NotFound(format!("Object {}", image_id.0)))?;
        let src = object
            .as_image()
            .map(|img| img.src.clone())
            .ok_or_else(|| PixxelError::Validation("no image on the canvas".to_string()))?;
        (src, object.display_size())
    };
    if transform::has_background_directive(&src) {
        return Err(PixxelError::Validation(
            "Cannot extend an image with a removed background".to_string(),
        ));
    }

    let (width, height) = new_dimensions(display, direction, amount);
    let url = transform::extension_url(&src, width, height, direction);
    tracing::info!(%direction, amount, width, height, "Extending image");

    session.set_processing(Some("Extending image with AI..."));
    let loaded = session.images().load(&url).await;
    session.set_processing(None);
    let image = loaded.inspect_err(|e| tracing::error!(url = %url, error = %e, "Extension failed"))?;

    if !session.is_current(&surface) {
        return Ok(Applied::Stale);
    }
    let (w, h) = (image.width() as f64, image.height() as f64);
    let scale = contain_scale(Size::new(w, h), logical).min(1.0);
    let applied = commit(&surface, |s| {
        s.register_element(url.clone(), image);
        let extended = SceneObject::new(
            ObjectId(0),
            ObjectKind::Image(ImageObject::new(url.clone(), w, h)),
            Transform::centered(logical.center(), scale),
        );
        let id = s.replace(image_id, extended)?;
        s.set_active(Some(id));
        Ok::<_, PixxelError>((id, s.to_json()?))
    })
    .await;

    let (id, blob) = match applied {
        Applied::Done(result) => result?,
        Applied::Stale => return Ok(Applied::Stale),
    };
    session
        .persist(ProjectPatch {
            current_image_url: Some(url),
            canvas_state: Some(blob),
            ..Default::default()
        })
        .await?;
    Ok(Applied::Done(id))
}
