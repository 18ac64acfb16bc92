//! # Persistence
//!
//! Project and user records behind the [`ProjectStore`] trait. Every call
//! carries the caller's identity; a missing identity fails with
//! [`PixxelError::Unauthenticated`] and touching another user's project
//! fails with [`PixxelError::AccessDenied`].
//!
//! [`MemoryStore`] is the bundled implementation. It keeps everything in
//! memory and can mirror its contents to a JSON snapshot file.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PixxelError, Result};
use crate::geometry::Size;

/// Authenticated caller, as resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub token_identifier: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture_url: Option<String>,
}

impl Identity {
    pub fn new(token_identifier: impl Into<String>) -> Self {
        Self {
            token_identifier: token_identifier.into(),
            name: None,
            email: None,
            picture_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Unwrap the caller identity or fail as unauthenticated.
pub fn require_identity(identity: Option<&Identity>) -> Result<&Identity> {
    identity.ok_or(PixxelError::Unauthenticated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub token_identifier: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub plan: Plan,
    pub projects_used: u32,
    pub exports_this_month: u32,
    /// `YYYY-MM` the export counter belongs to.
    #[serde(default)]
    pub export_period: Option<String>,
    pub created_at: i64,
    pub last_active_at: i64,
}

impl User {
    /// Exports counted in the current month. A counter left over from an
    /// earlier month reads as zero.
    pub fn current_exports(&self) -> u32 {
        if self.export_period.as_deref() == Some(current_period().as_str()) {
            self.exports_this_month
        } else {
            0
        }
    }
}

/// `YYYY-MM` of the current UTC month.
pub(crate) fn current_period() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub original_image_url: Option<String>,
    #[serde(default)]
    pub current_image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Serialized scene blob. Opaque outside the surface.
    #[serde(default)]
    pub canvas_state: Option<serde_json::Value>,
    #[serde(default)]
    pub active_transformations: Option<String>,
    #[serde(default)]
    pub background_removed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Project {
    /// Logical coordinate space of the project.
    pub fn logical_size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Image to hydrate a fresh canvas with: the current image, else the original.
    pub fn image_url(&self) -> Option<&str> {
        self.current_image_url
            .as_deref()
            .or(self.original_image_url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub original_image_url: Option<String>,
    #[serde(default)]
    pub current_image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub canvas_state: Option<serde_json::Value>,
}

/// Smallest accepted canvas side, in logical pixels.
pub const MIN_DIMENSION: u32 = 100;
/// Largest accepted canvas side, in logical pixels.
pub const MAX_DIMENSION: u32 = 5000;

/// Reject a canvas side outside `MIN_DIMENSION..=MAX_DIMENSION`.
pub fn check_dimension(name: &str, value: u32) -> Result<()> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(PixxelError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name, MIN_DIMENSION, MAX_DIMENSION, value
        )));
    }
    Ok(())
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        check_dimension("width", self.width)?;
        check_dimension("height", self.height)
    }
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. `None` leaves a field untouched.
///
/// `active_transformations` distinguishes "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_transformations: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_removed: Option<bool>,
}

impl ProjectPatch {
    /// Patch carrying only a scene blob.
    pub fn canvas(state: serde_json::Value) -> Self {
        Self {
            canvas_state: Some(state),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every set field onto `project`. Timestamps are left to the store.
    pub fn apply_to(&self, project: &mut Project) -> Result<()> {
        if let Some(width) = self.width {
            check_dimension("width", width)?;
        }
        if let Some(height) = self.height {
            check_dimension("height", height)?;
        }
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(width) = self.width {
            project.width = width;
        }
        if let Some(height) = self.height {
            project.height = height;
        }
        if let Some(state) = &self.canvas_state {
            project.canvas_state = Some(state.clone());
        }
        if let Some(url) = &self.current_image_url {
            project.current_image_url = Some(url.clone());
        }
        if let Some(url) = &self.thumbnail_url {
            project.thumbnail_url = Some(url.clone());
        }
        if let Some(transformations) = &self.active_transformations {
            project.active_transformations = transformations.clone();
        }
        if let Some(removed) = self.background_removed {
            project.background_removed = removed;
        }
        Ok(())
    }
}

/// Durable storage for users and projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Create the caller's user record, or refresh its name if it exists.
    async fn store_user(&self, identity: Option<&Identity>) -> Result<User>;

    async fn current_user(&self, identity: Option<&Identity>) -> Result<User>;

    /// Returns the new project's id. Enforces the free project limit.
    async fn create_project(&self, identity: Option<&Identity>, project: NewProject)
    -> Result<String>;

    /// `Ok(None)` when no such project exists.
    async fn get_project(&self, identity: Option<&Identity>, id: &str) -> Result<Option<Project>>;

    /// The caller's projects, most recently updated first.
    async fn list_projects(&self, identity: Option<&Identity>) -> Result<Vec<Project>>;

    async fn update_project(
        &self,
        identity: Option<&Identity>,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project>;

    async fn delete_project(&self, identity: Option<&Identity>, id: &str) -> Result<bool>;

    /// Count one export against the caller's monthly allowance.
    async fn record_export(&self, identity: Option<&Identity>) -> Result<User>;
}
