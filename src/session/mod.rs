//! # Editing Sessions
//!
//! An [`EditorSession`] owns at most one live [`GraphicsSurface`] for the
//! project being edited. It maps the project's logical size onto the
//! container, hydrates the surface, runs the autosave consumer and reacts
//! to tool and selection changes.
//!
//! ## Lifecycle
//!
//! ```text
//! Absent ──bind_project──▶ Initializing ──▶ Ready ──teardown──▶ Disposing ──▶ Absent
//! ```
//!
//! Tool operations and autosave only run in `Ready`. Binding again tears
//! the previous surface down before the next one is built, so two surfaces
//! never coexist.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pixxel::config::EditorConfig;
//! use pixxel::geometry::Size;
//! use pixxel::remote::HttpImageSource;
//! use pixxel::session::EditorSession;
//! use pixxel::store::{Identity, MemoryStore};
//!
//! # async fn example() -> pixxel::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let images = Arc::new(HttpImageSource::with_default_client()?);
//! let mut session = EditorSession::new(
//!     EditorConfig::default(),
//!     store,
//!     images,
//!     Some(Identity::new("token")),
//!     Size::new(1280.0, 800.0),
//! );
//! session.open_project("project-id").await?;
//! # Ok(())
//! # }
//! ```

mod autosave;
mod tool;

pub use autosave::{Autosave, SaveTarget};
pub use tool::{CursorStyle, ToolId};

use std::sync::Arc;

use crate::config::EditorConfig;
use crate::error::{PixxelError, Result};
use crate::geometry::{Size, ViewportFit};
use crate::plan::PlanAccess;
use crate::remote::ImageSource;
use crate::scene::{ImageObject, ObjectId, ObjectKind, ObjectType, Transform};
use crate::store::{Identity, Plan, Project, ProjectPatch, ProjectStore};
use crate::surface::{self, GraphicsSurface, SharedSurface};
use crate::tools::crop::CropState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Absent,
    Initializing,
    Ready,
    Disposing,
}

/// Outcome of an operation that may outlive the surface it started on.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied<T = ()> {
    Done(T),
    /// The surface was disposed or replaced meanwhile; nothing was changed.
    Stale,
}

impl<T> Applied<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Applied::Stale)
    }

    pub fn done(self) -> Option<T> {
        match self {
            Applied::Done(v) => Some(v),
            Applied::Stale => None,
        }
    }
}

/// Run `f` on the surface if it is still live.
pub async fn commit<R>(
    surface: &SharedSurface,
    f: impl FnOnce(&mut GraphicsSurface) -> R,
) -> Applied<R> {
    let mut guard = surface.lock().await;
    if !guard.is_live() {
        return Applied::Stale;
    }
    Applied::Done(f(&mut guard))
}

pub struct EditorSession {
    config: EditorConfig,
    store: Arc<dyn ProjectStore>,
    images: Arc<dyn ImageSource>,
    identity: Option<Identity>,
    plan: PlanAccess,
    project: Option<Project>,
    surface: Option<SharedSurface>,
    state: SurfaceState,
    active_tool: ToolId,
    processing: Option<String>,
    container: Size,
    autosave: Option<Autosave>,
    pub(crate) crop: Option<CropState>,
}

impl EditorSession {
    pub fn new(
        config: EditorConfig,
        store: Arc<dyn ProjectStore>,
        images: Arc<dyn ImageSource>,
        identity: Option<Identity>,
        container: Size,
    ) -> Self {
        Self {
            config,
            store,
            images,
            identity,
            plan: PlanAccess::new(Plan::Free),
            project: None,
            surface: None,
            state: SurfaceState::Absent,
            active_tool: ToolId::default(),
            processing: None,
            container,
            autosave: None,
            crop: None,
        }
    }

    // ===== Accessors =====

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    pub fn images(&self) -> &Arc<dyn ImageSource> {
        &self.images
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn plan(&self) -> PlanAccess {
        self.plan
    }

    pub fn set_plan(&mut self, plan: PlanAccess) {
        self.plan = plan;
    }

    /// Local copy of the bound project. Autosaves are folded in by
    /// [`EditorSession::refresh_project`] and by every explicit write.
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// The bound project, or `SurfaceNotReady` when nothing is bound.
    pub fn require_project(&self) -> Result<&Project> {
        self.project.as_ref().ok_or(PixxelError::SurfaceNotReady)
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    pub fn active_tool(&self) -> ToolId {
        self.active_tool
    }

    /// Message shown while a remote operation runs.
    pub fn processing(&self) -> Option<&str> {
        self.processing.as_deref()
    }

    pub(crate) fn set_processing(&mut self, message: Option<&str>) {
        self.processing = message.map(String::from);
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// Handle to the live surface. Fails unless the session is ready.
    pub fn surface(&self) -> Result<SharedSurface> {
        match (&self.surface, self.state) {
            (Some(surface), SurfaceState::Ready) => Ok(surface.clone()),
            _ => Err(PixxelError::SurfaceNotReady),
        }
    }

    /// Whether `surface` is still the one this session is editing.
    pub fn is_current(&self, surface: &SharedSurface) -> bool {
        self.is_ready()
            && self
                .surface
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, surface))
    }

    /// Logical size of the bound project.
    pub fn logical_size(&self) -> Result<Size> {
        Ok(self.require_project()?.logical_size())
    }

    // ===== Lifecycle =====

    /// Re-read the caller's plan from the store.
    pub async fn refresh_plan(&mut self) -> Result<PlanAccess> {
        let user = self.store.current_user(self.identity.as_ref()).await?;
        self.plan = PlanAccess::new(user.plan);
        Ok(self.plan)
    }

    /// Fetch a project by id and bind it.
    pub async fn open_project(&mut self, id: &str) -> Result<()> {
        let project = self
            .store
            .get_project(self.identity.as_ref(), id)
            .await?
            .ok_or_else(|| PixxelError::NotFound("Project".to_string()))?;
        if let Err(e) = self.refresh_plan().await {
            tracing::warn!(error = %e, "Could not load plan, assuming free");
            self.plan = PlanAccess::new(Plan::Free);
        }
        self.bind_project(project).await
    }

    /// Build a fresh surface for `project`.
    ///
    /// Any previous surface is disposed first. The current (or original)
    /// image is loaded and scaled to the logical width, then the stored
    /// scene blob, when present, replaces the contents. Failures in either
    /// load are logged and do not stop initialization.
    pub async fn bind_project(&mut self, project: Project) -> Result<()> {
        self.teardown().await;

        self.state = SurfaceState::Initializing;
        let logical = project.logical_size();
        let fit = ViewportFit::compute(logical, self.container);
        tracing::info!(
            project_id = %project.id,
            width = project.width,
            height = project.height,
            scale = fit.scale,
            "Binding project"
        );

        let shared = GraphicsSurface::new(logical, fit).into_shared();
        self.surface = Some(shared.clone());

        if let Some(url) = project.image_url() {
            match self.images.load(url).await {
                Ok(image) => {
                    let (w, h) = (image.width() as f64, image.height() as f64);
                    let mut surface = shared.lock().await;
                    surface.register_element(url, image);
                    let id = surface.add(
                        ObjectKind::Image(ImageObject::new(url, w, h)),
                        Transform::centered(logical.center(), 1.0),
                    );
                    surface.modify_quiet(id, |o| o.scale_to_width(logical.width));
                }
                Err(e) => tracing::warn!(url, error = %e, "Failed to load project image"),
            }
        }

        if let Some(blob) = project.canvas_state.as_ref().filter(|b| !b.is_null()) {
            match surface::load_scene(blob, self.images.as_ref()).await {
                Ok((scene, elements)) => shared.lock().await.install_scene(scene, elements),
                Err(e) => tracing::warn!(project_id = %project.id, error = %e, "Failed to load canvas state"),
            }
        }

        // Viewport pass.
        {
            let mut surface = shared.lock().await;
            surface.set_dimensions(ViewportFit::compute(logical, self.container));
            surface.set_cursor(self.active_tool.cursor());
        }

        let (autosave, sender) = Autosave::spawn(
            Arc::downgrade(&shared),
            SaveTarget {
                store: self.store.clone(),
                identity: self.identity.clone(),
                project_id: project.id.clone(),
            },
            self.config.autosave_debounce,
        );
        shared.lock().await.attach_listener(sender);
        self.autosave = Some(autosave);
        self.project = Some(project);
        self.state = SurfaceState::Ready;
        Ok(())
    }

    /// Dispose the surface and cancel any pending autosave.
    pub async fn teardown(&mut self) {
        if self.surface.is_none() && self.state == SurfaceState::Absent {
            return;
        }
        self.state = SurfaceState::Disposing;
        self.crop = None;
        if let Some(autosave) = self.autosave.take() {
            autosave.cancel();
        }
        if let Some(surface) = self.surface.take() {
            surface.lock().await.dispose();
        }
        self.processing = None;
        self.state = SurfaceState::Absent;
    }

    // ===== Reactions =====

    /// Track a new container size and refit the surface.
    pub async fn resize_viewport(&mut self, container: Size) -> Result<ViewportFit> {
        self.container = container;
        let logical = match &self.project {
            Some(project) => project.logical_size(),
            None => return Ok(ViewportFit::compute(Size::new(0.0, 0.0), container)),
        };
        let fit = ViewportFit::compute(logical, container);
        if let Ok(surface) = self.surface() {
            surface.lock().await.set_dimensions(fit);
        }
        Ok(fit)
    }

    /// Switch the active tool.
    ///
    /// Restricted tools fail with `UpgradeRequired`. Leaving the crop tool
    /// cancels an unconfirmed crop; entering it starts one when the canvas
    /// holds an image.
    pub async fn select_tool(&mut self, tool: ToolId) -> Result<()> {
        if !self.plan.has_access(tool) {
            return Err(PixxelError::UpgradeRequired(tool));
        }
        let previous = self.active_tool;
        if previous == ToolId::Crop && tool != ToolId::Crop && self.crop.is_some() {
            crate::tools::crop::cancel(self).await?;
        }
        self.active_tool = tool;

        if let Ok(surface) = self.surface() {
            surface.lock().await.set_cursor(tool.cursor());
            if tool == ToolId::Crop && self.crop.is_none() {
                let has_image = surface.lock().await.scene().first_of(ObjectType::Image).is_some();
                if has_image {
                    crate::tools::crop::begin(self).await?;
                }
            }
        }
        tracing::debug!(from = %previous, to = %tool, "Tool changed");
        Ok(())
    }

    /// Change the selection. Selecting text switches to the text tool.
    pub async fn select_object(&mut self, id: Option<ObjectId>) -> Result<()> {
        let surface = self.surface()?;
        let is_text = {
            let mut guard = surface.lock().await;
            guard.set_active(id);
            guard
                .scene()
                .active_object()
                .is_some_and(|o| o.object_type() == ObjectType::Text)
        };
        if is_text && self.active_tool != ToolId::Text {
            self.select_tool(ToolId::Text).await?;
        }
        Ok(())
    }

    /// Bring the local project copy up to date with the latest autosave.
    ///
    /// [`EditorSession::project`] reflects explicit writes only; autosaves
    /// land on a background task and are folded in here.
    pub fn refresh_project(&mut self) -> Option<&Project> {
        self.absorb_autosave();
        self.project.as_ref()
    }

    fn absorb_autosave(&mut self) {
        let Some(saved) = self.autosave.as_mut().and_then(Autosave::take_saved) else {
            return;
        };
        // Store timestamps increase with every write, so an older autosave
        // never overrides a newer explicit one.
        if let Some(project) = &mut self.project
            && project.id == saved.id
            && saved.updated_at > project.updated_at
        {
            *project = saved;
        }
    }

    /// Write `patch` to the store and mirror it on the local project copy.
    pub async fn persist(&mut self, patch: ProjectPatch) -> Result<Project> {
        self.absorb_autosave();
        let id = self.require_project()?.id.clone();
        let updated = self
            .store
            .update_project(self.identity.as_ref(), &id, patch)
            .await?;
        self.project = Some(updated.clone());
        Ok(updated)
    }

    /// Persist the current scene immediately, bypassing the debounce.
    pub async fn save_now(&mut self) -> Result<Project> {
        let blob = self.surface()?.lock().await.to_json()?;
        self.persist(ProjectPatch::canvas(blob)).await
    }

    /// Replace the local project copy's logical size (resize tool).
    pub(crate) fn set_project_size(&mut self, width: u32, height: u32) {
        if let Some(project) = &mut self.project {
            project.width = width;
            project.height = height;
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        if let Some(autosave) = self.autosave.take() {
            autosave.cancel();
        }
        if let Some(surface) = self.surface.take()
            && let Ok(mut guard) = surface.try_lock()
        {
            guard.dispose();
        }
    }
}
