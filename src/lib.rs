//! # Pixxel - Image Editing Engine
//!
//! Pixxel is the engine behind a browser-style image editor. It provides:
//!
//! - **Scene graph**: images, text and shapes in a project's logical
//!   coordinate space, serialized as a JSON blob
//! - **Editing sessions**: one live surface per project, fitted to a
//!   display container, with a debounced autosave
//! - **Tools**: resize, crop, filters, text, AI background removal and
//!   generative extension through an image transformation host
//! - **Export**: CPU rasterizer producing PNG, JPEG and WEBP at the
//!   project's exact logical size
//! - **HTTP service**: uploads, project records and exports over axum
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pixxel::{
//!     config::EditorConfig,
//!     geometry::Size,
//!     remote::HttpImageSource,
//!     render::ExportFormat,
//!     session::EditorSession,
//!     store::{Identity, MemoryStore, NewProject, ProjectStore},
//!     tools,
//! };
//!
//! # async fn example() -> pixxel::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let me = Identity::new("token").with_name("Ada");
//! store.store_user(Some(&me)).await?;
//! let id = store
//!     .create_project(
//!         Some(&me),
//!         NewProject {
//!             title: "Poster".to_string(),
//!             width: 800,
//!             height: 600,
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//! let images = Arc::new(HttpImageSource::with_default_client()?);
//! let mut session = EditorSession::new(
//!     EditorConfig::default(),
//!     store,
//!     images,
//!     Some(me),
//!     Size::new(1280.0, 800.0),
//! );
//! session.open_project(&id).await?;
//! tools::text::add(&session).await?;
//! let png = tools::export::export(&session, ExportFormat::Png).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`geometry`] | Sizes, rects and the logical ↔ display mapping |
//! | [`scene`] | Scene objects, filters and the JSON blob |
//! | [`surface`] | Live canvas that emits change events |
//! | [`session`] | Session lifecycle, tool selection, autosave |
//! | [`tools`] | Editing tools |
//! | [`render`] | Rasterizer and encoders |
//! | [`remote`] | Transformation URLs, image loading, stock photos |
//! | [`store`] | Users and projects |
//! | [`plan`] | Plan entitlements |
//! | [`server`] | HTTP API |
//! | [`config`] | Runtime settings |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod plan;
pub mod remote;
pub mod render;
pub mod scene;
pub mod server;
pub mod session;
pub mod store;
pub mod surface;
pub mod tools;

// Re-exports for convenience
pub use error::{PixxelError, Result};
pub use session::EditorSession;
pub use surface::GraphicsSurface;
