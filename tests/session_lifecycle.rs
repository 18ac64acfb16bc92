//! # Session Lifecycle Tests
//!
//! End-to-end behaviour of an editing session over the in-memory store and
//! image source: binding, the viewport mapping, autosave timing and the
//! tools that change the document.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pixxel::config::EditorConfig;
use pixxel::error::Result;
use pixxel::geometry::{Rect, Size};
use pixxel::remote::{Direction, MemoryImageSource};
use pixxel::render::ExportFormat;
use pixxel::scene::{ObjectKind, ObjectType, TextObject, Transform};
use pixxel::session::{EditorSession, SurfaceState, ToolId, commit};
use pixxel::store::{
    Identity, MemoryStore, NewProject, Plan, Project, ProjectPatch, ProjectStore, User,
};
use pixxel::tools::{self, text::TextStyle};
use pixxel::PixxelError;

const PHOTO: &str = "https://ik.imagekit.io/demo/photo.png";

// ============================================================================
// HELPERS
// ============================================================================

struct Fixture {
    store: Arc<MemoryStore>,
    images: Arc<MemoryImageSource>,
    me: Identity,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let me = Identity::new("tok-ada").with_name("Ada");
    store.store_user(Some(&me)).await.unwrap();
    let images = Arc::new(MemoryImageSource::new());
    images.insert(PHOTO, photo(400, 300));
    Fixture { store, images, me }
}

fn photo(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]))
}

async fn create(fx: &Fixture, width: u32, height: u32, url: Option<&str>) -> String {
    fx.store
        .create_project(
            Some(&fx.me),
            NewProject {
                title: "Test".to_string(),
                original_image_url: url.map(String::from),
                current_image_url: url.map(String::from),
                width,
                height,
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

fn session_with(fx: &Fixture, store: Arc<dyn ProjectStore>, container: Size) -> EditorSession {
    EditorSession::new(
        EditorConfig::default(),
        store,
        fx.images.clone(),
        Some(fx.me.clone()),
        container,
    )
}

async fn open(fx: &Fixture, id: &str, container: Size) -> EditorSession {
    let mut session = session_with(fx, fx.store.clone(), container);
    session.open_project(id).await.unwrap();
    session
}

async fn stored(fx: &Fixture, id: &str) -> Project {
    fx.store.get_project(Some(&fx.me), id).await.unwrap().unwrap()
}

fn decode(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

/// Store wrapper that counts scene writes.
struct CountingStore {
    inner: Arc<MemoryStore>,
    saves: AtomicUsize,
}

#[async_trait]
impl ProjectStore for CountingStore {
    async fn store_user(&self, identity: Option<&Identity>) -> Result<User> {
        self.inner.store_user(identity).await
    }

    async fn current_user(&self, identity: Option<&Identity>) -> Result<User> {
        self.inner.current_user(identity).await
    }

    async fn create_project(&self, identity: Option<&Identity>, project: NewProject) -> Result<String> {
        self.inner.create_project(identity, project).await
    }

    async fn get_project(&self, identity: Option<&Identity>, id: &str) -> Result<Option<Project>> {
        self.inner.get_project(identity, id).await
    }

    async fn list_projects(&self, identity: Option<&Identity>) -> Result<Vec<Project>> {
        self.inner.list_projects(identity).await
    }

    async fn update_project(
        &self,
        identity: Option<&Identity>,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project> {
        if patch.canvas_state.is_some() {
            self.saves.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.update_project(identity, id, patch).await
    }

    async fn delete_project(&self, identity: Option<&Identity>, id: &str) -> Result<bool> {
        self.inner.delete_project(identity, id).await
    }

    async fn record_export(&self, identity: Option<&Identity>) -> Result<User> {
        self.inner.record_export(identity).await
    }
}

// ============================================================================
// BINDING
// ============================================================================

#[tokio::test]
async fn test_800x600_project_in_small_container() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let session = open(&fx, &id, Size::new(400.0, 400.0)).await;

    assert_eq!(session.state(), SurfaceState::Ready);
    let surface = session.surface().unwrap();
    let guard = surface.lock().await;
    assert_eq!(guard.pixel_size(), (400, 300));
    assert_eq!(guard.zoom(), 0.5);

    // The 400x300 photo is scaled to the logical width and centred.
    let image = guard.scene().first_of(ObjectType::Image).unwrap();
    assert_eq!(image.bounding_rect(), Rect::new(0.0, 0.0, 800.0, 600.0));
}

#[tokio::test]
async fn test_large_container_never_upscales() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(4000.0, 4000.0)).await;
    assert_eq!(session.surface().unwrap().lock().await.pixel_size(), (800, 600));

    let fit = session.resize_viewport(Size::new(200.0, 600.0)).await.unwrap();
    assert_eq!((fit.pixel_width, fit.pixel_height), (200, 150));
    assert_eq!(session.surface().unwrap().lock().await.pixel_size(), (200, 150));
}

#[tokio::test]
async fn test_empty_project_exports_white_canvas() {
    let fx = fixture().await;
    let id = create(&fx, 320, 200, None).await;
    let session = open(&fx, &id, Size::new(1000.0, 1000.0)).await;

    let surface = session.surface().unwrap();
    assert!(surface.lock().await.scene().is_empty());

    let exported = tools::export::export(&session, ExportFormat::Png).await.unwrap();
    let img = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (320, 200));
    assert_eq!(img.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn test_missing_image_does_not_block_binding() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some("https://ik.imagekit.io/demo/gone.png")).await;
    let session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    assert!(session.is_ready());
    assert!(session.surface().unwrap().lock().await.scene().is_empty());
}

#[tokio::test]
async fn test_rebinding_disposes_previous_surface() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let first = session.surface().unwrap();

    session.open_project(&id).await.unwrap();
    let second = session.surface().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!first.lock().await.is_live());
    assert!(second.lock().await.is_live());
    assert!(!session.is_current(&first));
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let fx = fixture().await;
    let mut session = session_with(&fx, fx.store.clone(), Size::new(800.0, 600.0));
    let err = session.open_project("nope").await.unwrap_err();
    assert!(matches!(err, PixxelError::NotFound(_)));
    assert_eq!(session.state(), SurfaceState::Absent);
}

#[tokio::test]
async fn test_saved_scene_is_restored() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    tools::text::add(&session).await.unwrap();
    session.save_now().await.unwrap();
    session.teardown().await;

    let reopened = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let surface = reopened.surface().unwrap();
    let guard = surface.lock().await;
    assert_eq!(guard.scene().len(), 2);
    assert!(guard.scene().first_of(ObjectType::Text).is_some());
}

// ============================================================================
// TEARDOWN
// ============================================================================

#[tokio::test]
async fn test_operations_after_teardown_are_stale_or_rejected() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let surface = session.surface().unwrap();

    session.teardown().await;
    assert_eq!(session.state(), SurfaceState::Absent);

    let late = commit(&surface, |s| {
        s.add(ObjectKind::Text(TextObject::new("late")), Transform::default())
    })
    .await;
    assert!(late.is_stale());
    assert!(matches!(
        tools::text::add(&session).await,
        Err(PixxelError::SurfaceNotReady)
    ));
}

// ============================================================================
// AUTOSAVE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_autosave_waits_for_quiet_period() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let counting = Arc::new(CountingStore {
        inner: fx.store.clone(),
        saves: AtomicUsize::new(0),
    });
    let mut session = session_with(&fx, counting.clone(), Size::new(800.0, 600.0));
    session.open_project(&id).await.unwrap();

    let text = tools::text::add(&session).await.unwrap().done().unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(counting.saves.load(Ordering::SeqCst), 0);

    let style = TextStyle {
        bold: Some(true),
        ..Default::default()
    };
    tools::text::update(&session, text, &style).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    // 2.5s after the first edit, but only 1.5s after the last one.
    assert_eq!(counting.saves.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(counting.saves.load(Ordering::SeqCst), 1);

    let saved = stored(&fx, &id).await.canvas_state.unwrap();
    assert_eq!(saved["objects"].as_array().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_project_picks_up_autosave() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    assert!(session.project().unwrap().canvas_state.is_none());

    tools::text::add(&session).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let refreshed = session.refresh_project().unwrap().clone();
    let blob = refreshed.canvas_state.as_ref().unwrap();
    assert_eq!(blob["objects"].as_array().unwrap().len(), 2);
    assert_eq!(refreshed.updated_at, stored(&fx, &id).await.updated_at);
    assert_eq!(session.project(), Some(&refreshed));
}

#[tokio::test(start_paused = true)]
async fn test_selection_alone_never_saves() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let counting = Arc::new(CountingStore {
        inner: fx.store.clone(),
        saves: AtomicUsize::new(0),
    });
    let mut session = session_with(&fx, counting.clone(), Size::new(800.0, 600.0));
    session.open_project(&id).await.unwrap();

    session.select_object(None).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(counting.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_pending_save() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let counting = Arc::new(CountingStore {
        inner: fx.store.clone(),
        saves: AtomicUsize::new(0),
    });
    let mut session = session_with(&fx, counting.clone(), Size::new(800.0, 600.0));
    session.open_project(&id).await.unwrap();

    tools::text::add(&session).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    session.teardown().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(counting.saves.load(Ordering::SeqCst), 0);
}

// ============================================================================
// TOOLS
// ============================================================================

#[tokio::test]
async fn test_resize_then_export_uses_new_logical_size() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(600.0, 600.0)).await;

    let changed = tools::resize::apply(&mut session, 1200, 600).await.unwrap();
    assert_eq!(changed.done(), Some(true));
    assert_eq!(session.surface().unwrap().lock().await.pixel_size(), (600, 300));

    let exported = tools::export::export(&session, ExportFormat::Jpeg).await.unwrap();
    assert_eq!(decode(&exported.bytes), (1200, 600));
    assert_eq!(exported.file_name, "test.jpg");

    let project = stored(&fx, &id).await;
    assert_eq!((project.width, project.height), (1200, 600));
    assert!(project.canvas_state.is_some());

    let user = fx.store.current_user(Some(&fx.me)).await.unwrap();
    assert_eq!(user.exports_this_month, 1);
}

#[tokio::test]
async fn test_resize_to_same_size_is_noop() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let before = stored(&fx, &id).await.updated_at;

    let changed = tools::resize::apply(&mut session, 800, 600).await.unwrap();
    assert_eq!(changed.done(), Some(false));
    assert_eq!(stored(&fx, &id).await.updated_at, before);
}

#[tokio::test]
async fn test_crop_confirm_twice_is_noop() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;

    session.select_tool(ToolId::Crop).await.unwrap();
    let first = tools::crop::confirm(&mut session).await.unwrap().done().unwrap();
    let cropped = first.expect("crop applied");

    {
        let surface = session.surface().unwrap();
        let guard = surface.lock().await;
        let image = guard.scene().get(cropped).unwrap();
        assert_eq!(image.bounding_rect(), Rect::new(80.0, 60.0, 640.0, 480.0));
        assert_eq!(guard.scene().crop_rects().count(), 0);
    }

    let second = tools::crop::confirm(&mut session).await.unwrap();
    assert_eq!(second.done(), Some(None));
}

#[tokio::test]
async fn test_crop_overhanging_top_left_keeps_only_covered_pixels() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;

    // The photo fills the canvas at 2x; the rectangle hangs 100/50 px off it.
    session.select_tool(ToolId::Crop).await.unwrap();
    tools::crop::set_region(&mut session, Rect::new(-100.0, -50.0, 300.0, 250.0))
        .await
        .unwrap();
    let cropped = tools::crop::confirm(&mut session)
        .await
        .unwrap()
        .done()
        .unwrap()
        .expect("crop applied");

    {
        let surface = session.surface().unwrap();
        let guard = surface.lock().await;
        let image = guard.scene().get(cropped).unwrap();
        assert_eq!(image.bounding_rect(), Rect::new(0.0, 0.0, 200.0, 200.0));
        let src = image.as_image().unwrap();
        assert_eq!(
            (src.crop_x, src.crop_y, src.width, src.height),
            (0.0, 0.0, 100.0, 100.0)
        );
    }

    let exported = tools::export::export(&session, ExportFormat::Png).await.unwrap();
    let raster = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    assert_eq!(raster.get_pixel(100, 100), &Rgba([200, 40, 40, 255]));
    assert_eq!(raster.get_pixel(300, 100), &Rgba([255, 255, 255, 255]));
    assert_eq!(raster.get_pixel(100, 300), &Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn test_leaving_crop_tool_restores_image() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let surface = session.surface().unwrap();
    let before = surface.lock().await.scene().first_of(ObjectType::Image).cloned().unwrap();

    session.select_tool(ToolId::Crop).await.unwrap();
    assert_eq!(surface.lock().await.cursor(), ("crosshair", "crosshair"));
    session.select_tool(ToolId::Adjust).await.unwrap();

    let guard = surface.lock().await;
    let after = guard.scene().first_of(ObjectType::Image).unwrap();
    assert_eq!(after, &before);
    assert_eq!(guard.scene().crop_rects().count(), 0);
    assert_eq!(guard.cursor(), ("default", "move"));
}

#[tokio::test]
async fn test_selecting_text_switches_tool() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;

    let text = tools::text::add(&session).await.unwrap().done().unwrap();
    session.select_object(Some(text)).await.unwrap();
    assert_eq!(session.active_tool(), ToolId::Text);
}

#[tokio::test]
async fn test_free_plan_is_gated() {
    let fx = fixture().await;
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;

    let err = session.select_tool(ToolId::Background).await.unwrap_err();
    assert!(matches!(err, PixxelError::UpgradeRequired(ToolId::Background)));
    assert_eq!(session.active_tool(), ToolId::Resize);
    assert!(matches!(
        tools::extend::extend(&mut session, Direction::Left, 200).await,
        Err(PixxelError::UpgradeRequired(ToolId::AiExtender))
    ));

    fx.store.set_plan(Some(&fx.me), Plan::Pro).await.unwrap();
    session.refresh_plan().await.unwrap();
    session.select_tool(ToolId::Background).await.unwrap();
    assert_eq!(session.active_tool(), ToolId::Background);
}

#[tokio::test]
async fn test_background_removal_keeps_placement() {
    let fx = fixture().await;
    fx.store.set_plan(Some(&fx.me), Plan::Pro).await.unwrap();
    let removed_url = format!("{}?tr=e-bgremove", PHOTO);
    fx.images.insert(removed_url.clone(), photo(400, 300));
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let surface = session.surface().unwrap();
    let before = surface.lock().await.scene().first_of(ObjectType::Image).cloned().unwrap();

    let new_id = tools::background::remove_background(&mut session)
        .await
        .unwrap()
        .done()
        .unwrap();

    {
        let guard = surface.lock().await;
        let after = guard.scene().get(new_id).unwrap();
        assert_eq!(after.transform, before.transform);
        assert_eq!(after.as_image().unwrap().src, removed_url);
        assert_eq!(guard.scene().active(), Some(new_id));
    }
    let project = stored(&fx, &id).await;
    assert!(project.background_removed);
    assert_eq!(project.current_image_url.as_deref(), Some(removed_url.as_str()));

    // A cut-out cannot be extended.
    let err = tools::extend::extend(&mut session, Direction::Right, 200)
        .await
        .unwrap_err();
    assert!(matches!(err, PixxelError::Validation(_)));
}

#[tokio::test]
async fn test_extend_then_reset() {
    let fx = fixture().await;
    fx.store.set_plan(Some(&fx.me), Plan::Pro).await.unwrap();
    let extended_url = format!("{}?tr=bg-genfill,w-1000,h-600,cm-pad_resize,fo-left", PHOTO);
    fx.images.insert(extended_url.clone(), photo(1000, 600));
    let id = create(&fx, 800, 600, Some(PHOTO)).await;
    let mut session = open(&fx, &id, Size::new(800.0, 600.0)).await;
    let surface = session.surface().unwrap();

    let new_id = tools::extend::extend(&mut session, Direction::Right, 200)
        .await
        .unwrap()
        .done()
        .unwrap();
    {
        let guard = surface.lock().await;
        let image = guard.scene().get(new_id).unwrap();
        assert_eq!(image.as_image().unwrap().src, extended_url);
        assert_eq!(image.transform.scale_x, 0.8);
        assert_eq!(image.center(), Size::new(800.0, 600.0).center());
    }
    assert_eq!(
        stored(&fx, &id).await.current_image_url.as_deref(),
        Some(extended_url.as_str())
    );

    let reloaded = tools::reset::reset(&mut session).await.unwrap().done().unwrap();
    assert!(reloaded.is_some());
    let project = stored(&fx, &id).await;
    assert_eq!(project.current_image_url.as_deref(), Some(PHOTO));
    assert!(!project.background_removed);
    assert_eq!(project.active_transformations, None);

    let guard = surface.lock().await;
    assert_eq!(guard.scene().len(), 1);
    let image = guard.scene().first_of(ObjectType::Image).unwrap();
    assert_eq!(image.as_image().unwrap().src, PHOTO);
    assert!(image.as_image().unwrap().filters.is_empty());
}

#[tokio::test]
async fn test_free_export_quota() {
    let fx = fixture().await;
    let id = create(&fx, 200, 200, None).await;
    let session = open(&fx, &id, Size::new(200.0, 200.0)).await;
    for _ in 0..20 {
        fx.store.record_export(Some(&fx.me)).await.unwrap();
    }

    let err = tools::export::export(&session, ExportFormat::Png).await.unwrap_err();
    assert!(matches!(err, PixxelError::PlanLimit(_)));
    let user = fx.store.current_user(Some(&fx.me)).await.unwrap();
    assert_eq!(user.exports_this_month, 20);
}
