//! Canvas resize.
//!
//! Changing the canvas size changes the project's logical coordinate space.
//! Objects keep their coordinates; whatever falls outside is simply not
//! drawn.

use serde::Serialize;

use crate::error::Result;
use crate::geometry::{Size, ViewportFit};
use crate::session::{Applied, EditorSession};
use crate::store::{ProjectPatch, check_dimension};

pub use crate::store::{MAX_DIMENSION, MIN_DIMENSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectPreset {
    pub name: &'static str,
    pub ratio: (u32, u32),
    pub label: &'static str,
}

pub const PRESETS: [AspectPreset; 6] = [
    AspectPreset { name: "Instagram Story", ratio: (9, 16), label: "9:16" },
    AspectPreset { name: "Instagram Post", ratio: (1, 1), label: "1:1" },
    AspectPreset { name: "YouTube Thumbnail", ratio: (16, 9), label: "16:9" },
    AspectPreset { name: "Portrait", ratio: (2, 3), label: "2:3" },
    AspectPreset { name: "Facebook Cover", ratio: (851, 315), label: "2.7:1" },
    AspectPreset { name: "Twitter Header", ratio: (3, 1), label: "3:1" },
];

impl AspectPreset {
    pub fn aspect(&self) -> f64 {
        self.ratio.0 as f64 / self.ratio.1 as f64
    }

    /// Dimensions with this aspect and the same area as `current`.
    pub fn dimensions_for(&self, current: Size) -> (u32, u32) {
        let aspect = self.aspect();
        let height = (current.area() / aspect).sqrt();
        let width = height * aspect;
        (width.round() as u32, height.round() as u32)
    }

    pub fn find(name: &str) -> Option<&'static AspectPreset> {
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Height matching `width` at the aspect of `current`.
pub fn locked_height(width: u32, current: Size) -> u32 {
    if current.width <= 0.0 {
        return width;
    }
    (width as f64 * current.height / current.width).round() as u32
}

/// Width matching `height` at the aspect of `current`.
pub fn locked_width(height: u32, current: Size) -> u32 {
    if current.height <= 0.0 {
        return height;
    }
    (height as f64 * current.width / current.height).round() as u32
}

/// Resize the canvas to `width` × `height`.
///
/// Returns `Done(false)` when the size is unchanged. Otherwise the surface
/// is refitted to the current container and the new size is persisted
/// together with the scene.
pub async fn apply(session: &mut EditorSession, width: u32, height: u32) -> Result<Applied<bool>> {
    let surface = session.surface()?;
    let project = session.require_project()?;
    if project.width == width && project.height == height {
        return Ok(Applied::Done(false));
    }
    check_dimension("width", width)?;
    check_dimension("height", height)?;

    session.set_processing(Some("Resizing canvas..."));
    let logical = Size::new(width as f64, height as f64);
    let fit = ViewportFit::compute(logical, session.container());
    let blob = {
        let mut guard = surface.lock().await;
        guard.set_logical_size(logical);
        guard.set_dimensions(fit);
        guard.to_json()
    };
    session.set_project_size(width, height);

    let result = match blob {
        Ok(blob) => {
            session
                .persist(ProjectPatch {
                    width: Some(width),
                    height: Some(height),
                    canvas_state: Some(blob),
                    ..Default::default()
                })
                .await
        }
        Err(e) => Err(e),
    };
    session.set_processing(None);
    result?;

    tracing::info!(width, height, zoom = fit.zoom, "Canvas resized");
    Ok(Applied::Done(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_preserve_area() {
        let current = Size::new(800.0, 600.0);
        let (w, h) = AspectPreset::find("Instagram Post").unwrap().dimensions_for(current);
        assert_eq!((w, h), (693, 693));
        let (w, h) = AspectPreset::find("youtube thumbnail").unwrap().dimensions_for(current);
        assert_eq!((w, h), (924, 520));
    }

    #[test]
    fn test_locked_dimensions() {
        let current = Size::new(800.0, 600.0);
        assert_eq!(locked_height(1200, current), 900);
        assert_eq!(locked_width(300, current), 400);
    }

    #[test]
    fn test_dimension_bounds() {
        assert!(check_dimension("width", MIN_DIMENSION).is_ok());
        assert!(check_dimension("width", MAX_DIMENSION).is_ok());
        assert!(check_dimension("width", 99).is_err());
        assert!(check_dimension("width", 5001).is_err());
    }
}
