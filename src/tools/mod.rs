//! # Editing Tools
//!
//! Each tool is a set of free functions over an [`EditorSession`]. They all
//! require a ready session and fail with `SurfaceNotReady` otherwise.
//!
//! | Tool | Plan | Module |
//! |------|------|--------|
//! | Resize canvas | free | [`resize`] |
//! | Crop image | free | [`crop`] |
//! | Filters | free | [`adjust`] |
//! | Text overlay | free | [`text`] |
//! | Background removal / replacement | pro | [`background`] |
//! | Generative extension | pro | [`extend`] |
//! | Reset to original | any | [`reset`] |
//! | Export | any (quota on free) | [`export`] |

pub mod adjust;
pub mod background;
pub mod crop;
pub mod export;
pub mod extend;
pub mod reset;
pub mod resize;
pub mod text;

use crate::error::{PixxelError, Result};
use crate::scene::ObjectId;
use crate::session::{EditorSession, ToolId};
use crate::surface::SharedSurface;

/// Fail with `UpgradeRequired` when the session's plan lacks `tool`.
pub(crate) fn require_access(session: &EditorSession, tool: ToolId) -> Result<()> {
    if session.plan().has_access(tool) {
        Ok(())
    } else {
        Err(PixxelError::UpgradeRequired(tool))
    }
}

/// The active image, else the first image on the canvas.
pub(crate) async fn main_image(surface: &SharedSurface) -> Result<ObjectId> {
    surface
        .lock()
        .await
        .scene()
        .active_or_first_image()
        .ok_or_else(|| PixxelError::Validation("no image on the canvas".to_string()))
}
