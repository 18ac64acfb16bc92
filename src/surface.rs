//! # Graphics Surface
//!
//! Live, mutable canvas for one editing session: the [`Scene`], the decoded
//! image elements it references, the logical size and the on-screen fit.
//!
//! Every document mutation made through the surface emits a [`SceneChange`]
//! to the attached listener. Selection changes are emitted too, but are not
//! mutations and never schedule a save.
//!
//! The surface never touches the network. Callers fetch images first and
//! hand the decoded pixels in, so no lock is held across a download.

use image::RgbaImage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{PixxelError, Result};
use crate::geometry::{Size, ViewportFit};
use crate::remote::ImageSource;
use crate::render::{self, ElementCache, ExportFormat};
use crate::scene::{Color, Filter, ObjectId, ObjectKind, Scene, SceneObject, Transform};
use crate::session::CursorStyle;

/// Shared handle to a live surface.
pub type SharedSurface = Arc<Mutex<GraphicsSurface>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
    /// Active object changed. Not a document mutation.
    Selection,
}

impl ChangeKind {
    /// Whether this change alters persisted state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, ChangeKind::Added | ChangeKind::Modified | ChangeKind::Removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneChange {
    pub kind: ChangeKind,
    /// Object concerned; `None` for canvas-level changes such as the background.
    pub object: Option<ObjectId>,
}

pub struct GraphicsSurface {
    scene: Scene,
    elements: ElementCache,
    logical: Size,
    fit: ViewportFit,
    cursor: CursorStyle,
    listener: Option<UnboundedSender<SceneChange>>,
    disposed: bool,
}

impl GraphicsSurface {
    /// Empty surface for a `logical` canvas displayed with `fit`.
    pub fn new(logical: Size, fit: ViewportFit) -> Self {
        Self {
            scene: Scene::new(),
            elements: ElementCache::new(),
            logical,
            fit,
            cursor: ("default", "move"),
            listener: None,
            disposed: false,
        }
    }

    pub fn into_shared(self) -> SharedSurface {
        Arc::new(Mutex::new(self))
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn logical_size(&self) -> Size {
        self.logical
    }

    pub fn set_logical_size(&mut self, logical: Size) {
        self.logical = logical;
    }

    pub fn fit(&self) -> ViewportFit {
        self.fit
    }

    /// On-screen size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.fit.pixel_width, self.fit.pixel_height)
    }

    pub fn zoom(&self) -> f64 {
        self.fit.zoom
    }

    /// Apply new display dimensions and zoom. Object coordinates are untouched.
    pub fn set_dimensions(&mut self, fit: ViewportFit) {
        self.fit = fit;
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }

    pub fn is_live(&self) -> bool {
        !self.disposed
    }

    /// Route change events to `listener`, replacing any previous one.
    pub fn attach_listener(&mut self, listener: UnboundedSender<SceneChange>) {
        self.listener = Some(listener);
    }

    pub fn detach_listener(&mut self) {
        self.listener = None;
    }

    fn emit(&self, kind: ChangeKind, object: Option<ObjectId>) {
        if self.disposed {
            return;
        }
        if let Some(listener) = &self.listener {
            // A closed channel means the session is tearing down.
            let _ = listener.send(SceneChange { kind, object });
        }
    }

    // ===== Elements =====

    pub fn register_element(&mut self, src: impl Into<String>, image: Arc<RgbaImage>) {
        self.elements.insert(src.into(), image);
    }

    pub fn element(&self, src: &str) -> Option<&Arc<RgbaImage>> {
        self.elements.get(src)
    }

    // ===== Mutations =====

    pub fn add(&mut self, kind: ObjectKind, transform: Transform) -> ObjectId {
        let id = self.scene.add(kind, transform);
        self.emit(ChangeKind::Added, Some(id));
        id
    }

    /// Add a prepared object (its id is reassigned).
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = self.scene.insert(object);
        self.emit(ChangeKind::Added, Some(id));
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let removed = self.scene.remove(id)?;
        self.emit(ChangeKind::Removed, Some(id));
        Some(removed)
    }

    /// Swap an object for another at the same stacking position.
    pub fn replace(&mut self, id: ObjectId, replacement: SceneObject) -> Result<ObjectId> {
        let new_id = self
            .scene
            .replace(id, replacement)
            .ok_or_else(|| PixxelError::NotFound(format!("Object {}", id.0)))?;
        self.emit(ChangeKind::Removed, Some(id));
        self.emit(ChangeKind::Added, Some(new_id));
        Ok(new_id)
    }

    /// Edit an object in place, emitting one modification.
    pub fn modify<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut SceneObject) -> R) -> Result<R> {
        let object = self
            .scene
            .get_mut(id)
            .ok_or_else(|| PixxelError::NotFound(format!("Object {}", id.0)))?;
        let out = f(object);
        self.emit(ChangeKind::Modified, Some(id));
        Ok(out)
    }

    /// Edit an object without emitting. For editor-only state such as
    /// toggling selectability while cropping.
    pub(crate) fn modify_quiet<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut SceneObject) -> R,
    ) -> Option<R> {
        self.scene.get_mut(id).map(f)
    }

    /// Replace an image's filter list as one transaction.
    ///
    /// Exactly one modification is emitted however many filters change.
    pub fn apply_filters(&mut self, id: ObjectId, filters: Vec<Filter>) -> Result<()> {
        let object = self
            .scene
            .get_mut(id)
            .ok_or_else(|| PixxelError::NotFound(format!("Object {}", id.0)))?;
        let image = object
            .as_image_mut()
            .ok_or_else(|| PixxelError::Validation("filters apply to images only".to_string()))?;
        image.filters = filters;
        self.emit(ChangeKind::Modified, Some(id));
        Ok(())
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.scene.background = color;
        self.emit(ChangeKind::Modified, None);
    }

    pub fn set_background_image(&mut self, image: Option<SceneObject>) {
        self.scene.background_image = image;
        self.emit(ChangeKind::Modified, None);
    }

    /// Remove every object and reset the background to white.
    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self.scene.objects().iter().map(|o| o.id).collect();
        self.scene.clear();
        for id in ids {
            self.emit(ChangeKind::Removed, Some(id));
        }
        self.emit(ChangeKind::Modified, None);
    }

    pub fn set_active(&mut self, id: Option<ObjectId>) {
        self.scene.set_active(id);
        self.emit(ChangeKind::Selection, self.scene.active());
    }

    /// Helpers are editor furniture; adding or removing them emits nothing.
    pub(crate) fn insert_helper(&mut self, object: SceneObject) -> ObjectId {
        self.scene.insert(object)
    }

    pub(crate) fn remove_helper(&mut self, id: ObjectId) -> Option<SceneObject> {
        match self.scene.get(id) {
            Some(obj) if obj.helper.is_some() => self.scene.remove(id),
            _ => None,
        }
    }

    pub(crate) fn modify_helper<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut SceneObject) -> R,
    ) -> Option<R> {
        match self.scene.get_mut(id) {
            Some(obj) if obj.helper.is_some() => Some(f(obj)),
            _ => None,
        }
    }

    // ===== Serialization =====

    /// Serialized document blob. Helpers are omitted.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.scene.to_json()
    }

    /// Install a deserialized scene, replacing the current contents.
    ///
    /// No change events are emitted: this is a load, not an edit.
    pub fn install_scene(&mut self, scene: Scene, elements: ElementCache) {
        self.scene = scene;
        self.elements.extend(elements);
    }

    // ===== Output =====

    /// Preview raster at the current zoom, helpers included.
    pub fn render_preview(&self) -> RgbaImage {
        render::rasterize_preview(&self.scene, &self.elements, self.logical, self.fit.zoom)
    }

    /// Document raster at exactly the logical size.
    pub fn export_raster(&self) -> RgbaImage {
        render::rasterize(&self.scene, &self.elements, self.logical, 1.0)
    }

    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        render::encode(&self.export_raster(), format)
    }

    /// Release everything. Later events are dropped.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.listener = None;
        self.scene = Scene::new();
        self.elements.clear();
    }
}

/// Parse a scene blob and fetch every image it references.
///
/// Images that fail to load are logged and left out; the objects stay in
/// the scene and are skipped when drawn.
pub async fn load_scene(
    blob: &serde_json::Value,
    source: &dyn ImageSource,
) -> Result<(Scene, ElementCache)> {
    let scene = Scene::from_json(blob)?;
    let mut elements = ElementCache::new();
    for src in scene.image_sources() {
        match source.load(&src).await {
            Ok(image) => {
                elements.insert(src, image);
            }
            Err(e) => tracing::warn!(src = %src, error = %e, "Failed to load scene image"),
        }
    }
    Ok((scene, elements))
}
