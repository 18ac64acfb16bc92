//! Background tools: AI removal, solid colours and stock-photo backdrops.

use crate::error::{PixxelError, Result};
use crate::geometry::{Size, cover_scale};
use crate::remote::StockPhotoClient;
use crate::remote::stock::StockPhoto;
use crate::remote::transform::{self, BG_REMOVE};
use crate::scene::{Color, ImageObject, ObjectId, ObjectKind, SceneObject, Transform};
use crate::session::{Applied, EditorSession, ToolId, commit};
use crate::store::ProjectPatch;

/// Replace the main image with a background-removed version.
///
/// Position, scale, rotation and origin carry over. Images not served by
/// the transformation host cannot be processed and are reloaded as-is.
pub async fn remove_background(session: &mut EditorSession) -> Result<Applied<ObjectId>> {
    super::require_access(session, ToolId::Background)?;
    let surface = session.surface()?;
    let image_id = super::main_image(&surface).await?;

    let source_url = match session.require_project()?.image_url() {
        Some(url) => url.to_string(),
        None => surface
            .lock()
            .await
            .scene()
            .get(image_id)
            .and_then(|o| o.as_image())
            .map(|img| img.src.clone())
            .ok_or_else(|| PixxelError::Validation("no image available".to_string()))?,
    };
    let url = transform::background_removal_url(&source_url, &session.config().transform_host);

    session.set_processing(Some("Removing background with AI..."));
    let loaded = session.images().load(&url).await;
    session.set_processing(None);
    let image = loaded.inspect_err(|e| tracing::error!(url = %url, error = %e, "Background removal failed"))?;

    if !session.is_current(&surface) {
        return Ok(Applied::Stale);
    }
    let (w, h) = (image.width() as f64, image.height() as f64);
    let applied = commit(&surface, |s| {
        let previous = s.scene().get(image_id)?.transform;
        s.register_element(url.clone(), image);
        let replacement = SceneObject::new(
            ObjectId(0),
            ObjectKind::Image(ImageObject::new(url.clone(), w, h)),
            previous,
        );
        let id = s.replace(image_id, replacement).ok()?;
        s.set_active(Some(id));
        Some(id)
    })
    .await;

    let id = match applied {
        Applied::Done(Some(id)) => id,
        Applied::Done(None) => {
            return Err(PixxelError::Validation("image was removed meanwhile".to_string()));
        }
        Applied::Stale => return Ok(Applied::Stale),
    };

    if url != source_url {
        session
            .persist(ProjectPatch {
                current_image_url: Some(url),
                active_transformations: Some(Some(BG_REMOVE.to_string())),
                background_removed: Some(true),
                ..Default::default()
            })
            .await?;
    }
    tracing::info!(object = id.0, "Background removed");
    Ok(Applied::Done(id))
}

/// Fill the canvas behind everything with `color`, dropping any backdrop image.
pub async fn set_color(session: &EditorSession, color: Color) -> Result<Applied> {
    let surface = session.surface()?;
    Ok(commit(&surface, |s| {
        s.set_background_image(None);
        s.set_background(Some(color));
    })
    .await)
}

/// Remove both the background colour and image.
pub async fn clear(session: &EditorSession) -> Result<Applied> {
    let surface = session.surface()?;
    Ok(commit(&surface, |s| {
        s.set_background(None);
        s.set_background_image(None);
    })
    .await)
}

/// Search stock photos for backdrops.
pub async fn search(stock: &StockPhotoClient, query: &str) -> Result<Vec<StockPhoto>> {
    stock.search(query).await
}

/// Load `url` and set it as the canvas backdrop, scaled to cover the canvas.
pub async fn set_image(session: &mut EditorSession, url: &str) -> Result<Applied> {
    super::require_access(session, ToolId::Background)?;
    let surface = session.surface()?;
    let logical = session.logical_size()?;

    session.set_processing(Some("Loading background..."));
    let loaded = session.images().load(url).await;
    session.set_processing(None);
    let image = loaded?;

    if !session.is_current(&surface) {
        return Ok(Applied::Stale);
    }
    let (w, h) = (image.width() as f64, image.height() as f64);
    let scale = cover_scale(Size::new(w, h), logical);
    let url = url.to_string();
    Ok(commit(&surface, |s| {
        s.register_element(url.clone(), image);
        let backdrop = SceneObject::new(
            ObjectId(0),
            ObjectKind::Image(ImageObject::new(url, w, h)),
            Transform::centered(logical.center(), scale),
        );
        s.set_background_image(Some(backdrop));
    })
    .await)
}

/// Use a stock photo as the backdrop. The download is reported to the
/// photo API in the background; that report never affects the result.
pub async fn use_stock_photo(
    session: &mut EditorSession,
    stock: &StockPhotoClient,
    photo: &StockPhoto,
) -> Result<Applied> {
    super::require_access(session, ToolId::Background)?;
    let tracker = stock.clone();
    let photo_id = photo.id.clone();
    tokio::spawn(async move { tracker.track_download(&photo_id).await });

    set_image(session, &photo.urls.regular).await
}
