//! Reset the project to its original upload.

use crate::error::Result;
use crate::geometry::{Size, contain_scale};
use crate::scene::{ImageObject, ObjectId, ObjectKind, Transform};
use crate::session::{Applied, EditorSession, commit};
use crate::store::ProjectPatch;

/// Discard every edit: the canvas is cleared to white and the original image
/// is placed back, fitted inside the canvas with no filters. Stored AI
/// transformation state is cleared along with it.
///
/// Returns the id of the reloaded image, or `None` when the project has no
/// original image or it failed to load.
pub async fn reset(session: &mut EditorSession) -> Result<Applied<Option<ObjectId>>> {
    let surface = session.surface()?;
    let logical = session.logical_size()?;
    let original = session.require_project()?.original_image_url.clone();

    if let Some(crop) = session.crop.take() {
        tracing::debug!(image = crop.image.0, "Dropping crop in progress");
    }

    session.set_processing(Some("Resetting to original..."));
    let loaded = match &original {
        Some(url) => match session.images().load(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to reload original image");
                None
            }
        },
        None => None,
    };
    session.set_processing(None);

    if !session.is_current(&surface) {
        return Ok(Applied::Stale);
    }
    let applied = commit(&surface, |s| {
        s.clear();
        let id = match (&original, loaded) {
            (Some(url), Some(image)) => {
                let (w, h) = (image.width() as f64, image.height() as f64);
                let scale = contain_scale(Size::new(w, h), logical);
                s.register_element(url.clone(), image);
                Some(s.add(
                    ObjectKind::Image(ImageObject::new(url.clone(), w, h)),
                    Transform::centered(logical.center(), scale),
                ))
            }
            _ => None,
        };
        s.to_json().map(|blob| (id, blob))
    })
    .await;

    let (id, blob) = match applied {
        Applied::Done(result) => result?,
        Applied::Stale => return Ok(Applied::Stale),
    };
    session
        .persist(ProjectPatch {
            canvas_state: Some(blob),
            current_image_url: original,
            active_transformations: Some(None),
            background_removed: Some(false),
            ..Default::default()
        })
        .await?;
    tracing::info!("Project reset to original");
    Ok(Applied::Done(id))
}
