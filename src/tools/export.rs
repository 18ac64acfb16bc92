//! Export the document as an image file.

use crate::error::{PixxelError, Result};
use crate::plan::{FREE_EXPORT_LIMIT, PlanAccess};
use crate::render::ExportFormat;
use crate::session::EditorSession;
use crate::store::{Identity, ProjectStore};
use crate::surface::GraphicsSurface;

/// Encoded document plus what to call it.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub file_name: String,
}

/// File name for an export of `title`: lowercased, non-alphanumerics
/// collapsed to `-`.
pub fn file_name(title: &str, format: ExportFormat) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_matches('-');
    let stem = if stem.is_empty() { "pixxel-export" } else { stem };
    format!("{}.{}", stem, format.extension())
}

/// Check the caller's export allowance. Fails with `PlanLimit` once a free
/// account has used its monthly exports.
pub async fn check_quota(store: &dyn ProjectStore, identity: Option<&Identity>) -> Result<()> {
    let user = store.current_user(identity).await?;
    if !PlanAccess::new(user.plan).can_export(user.current_exports()) {
        return Err(PixxelError::PlanLimit(format!(
            "Free plan limited to {} exports per month. Upgrade to Pro for unlimited exports.",
            FREE_EXPORT_LIMIT
        )));
    }
    Ok(())
}

/// Count an encoded export and name the file.
async fn record(
    store: &dyn ProjectStore,
    identity: Option<&Identity>,
    bytes: Vec<u8>,
    title: &str,
    format: ExportFormat,
) -> Result<ExportedImage> {
    let user = store.record_export(identity).await?;
    tracing::info!(
        format = format.name(),
        bytes = bytes.len(),
        exports = user.exports_this_month,
        "Exported"
    );
    Ok(ExportedImage {
        bytes,
        format,
        file_name: file_name(title, format),
    })
}

/// Quota check, encode, then count the export.
///
/// The raster always has the project's logical size whatever the display
/// zoom. Nothing is counted when encoding fails.
pub async fn export_surface(
    store: &dyn ProjectStore,
    identity: Option<&Identity>,
    surface: &GraphicsSurface,
    title: &str,
    format: ExportFormat,
) -> Result<ExportedImage> {
    check_quota(store, identity).await?;
    let bytes = surface.export(format)?;
    record(store, identity, bytes, title, format).await
}

/// Export the session's canvas.
pub async fn export(session: &EditorSession, format: ExportFormat) -> Result<ExportedImage> {
    let surface = session.surface()?;
    let title = session.require_project()?.title.clone();
    let store = session.store().as_ref();
    check_quota(store, session.identity()).await?;
    let bytes = surface.lock().await.export(format)?;
    record(store, session.identity(), bytes, &title, format).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("My Beach Trip!", ExportFormat::Png), "my-beach-trip.png");
        assert_eq!(file_name("  ", ExportFormat::Jpeg), "pixxel-export.jpg");
        assert_eq!(file_name("a__b", ExportFormat::Webp), "a-b.webp");
    }
}
