//! In-memory store with an optional JSON snapshot.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Identity, NewProject, Plan, Project, ProjectPatch, ProjectStore, User, current_period,
    require_identity,
};
use crate::error::{PixxelError, Result};
use crate::plan::PlanAccess;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    users: HashMap<String, User>,
    projects: HashMap<String, Project>,
}

impl StoreData {
    fn user_by_token(&self, token: &str) -> Option<&User> {
        self.users.values().find(|u| u.token_identifier == token)
    }

    fn user_id_for(&self, identity: Option<&Identity>) -> Result<String> {
        let identity = require_identity(identity)?;
        self.user_by_token(&identity.token_identifier)
            .map(|u| u.id.clone())
            .ok_or_else(|| PixxelError::NotFound("User".to_string()))
    }

    fn owned_project_mut(&mut self, user_id: &str, id: &str) -> Result<&mut Project> {
        let project = self
            .projects
            .get_mut(id)
            .ok_or_else(|| PixxelError::NotFound("Project".to_string()))?;
        if project.user_id != user_id {
            return Err(PixxelError::AccessDenied);
        }
        Ok(project)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct MemoryStore {
    data: RwLock<StoreData>,
    snapshot: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store that lives only in memory.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            snapshot: None,
        }
    }

    /// Store mirrored to `path`. Existing contents are loaded.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), "Opened project store snapshot");
        Ok(Self {
            data: RwLock::new(data),
            snapshot: Some(path),
        })
    }

    async fn persist(&self, data: &StoreData) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Switch the caller's plan. Billing lives elsewhere; this is the hook it calls.
    pub async fn set_plan(&self, identity: Option<&Identity>, plan: Plan) -> Result<User> {
        let mut data = self.data.write().await;
        let user_id = data.user_id_for(identity)?;
        let user = data
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PixxelError::NotFound("User".to_string()))?;
        user.plan = plan;
        let user = user.clone();
        self.persist(&data).await?;
        Ok(user)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn store_user(&self, identity: Option<&Identity>) -> Result<User> {
        let identity = require_identity(identity)?;
        let mut data = self.data.write().await;

        if let Some(existing) = data.user_by_token(&identity.token_identifier) {
            let id = existing.id.clone();
            let user = data
                .users
                .get_mut(&id)
                .ok_or_else(|| PixxelError::NotFound("User".to_string()))?;
            if let Some(name) = &identity.name
                && *name != user.name
            {
                user.name = name.clone();
            }
            user.last_active_at = now_ms();
            let user = user.clone();
            self.persist(&data).await?;
            return Ok(user);
        }

        let now = now_ms();
        let user = User {
            id: Uuid::new_v4().to_string(),
            token_identifier: identity.token_identifier.clone(),
            name: identity.name.clone().unwrap_or_else(|| "Anonymous".to_string()),
            email: identity.email.clone().unwrap_or_default(),
            image_url: identity.picture_url.clone(),
            plan: Plan::Free,
            projects_used: 0,
            exports_this_month: 0,
            export_period: Some(current_period()),
            created_at: now,
            last_active_at: now,
        };
        tracing::info!(user_id = %user.id, "Created user");
        data.users.insert(user.id.clone(), user.clone());
        self.persist(&data).await?;
        Ok(user)
    }

    async fn current_user(&self, identity: Option<&Identity>) -> Result<User> {
        let data = self.data.read().await;
        let user_id = data.user_id_for(identity)?;
        let mut user = data
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PixxelError::NotFound("User".to_string()))?;
        if user.export_period.as_deref() != Some(current_period().as_str()) {
            user.exports_this_month = 0;
        }
        Ok(user)
    }

    async fn create_project(
        &self,
        identity: Option<&Identity>,
        project: NewProject,
    ) -> Result<String> {
        project.validate()?;
        let mut data = self.data.write().await;
        let user_id = data.user_id_for(identity)?;
        let plan = data
            .users
            .get(&user_id)
            .map(|u| u.plan)
            .unwrap_or_default();

        let owned = data
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .count() as u32;
        if !PlanAccess::new(plan).can_create_project(owned) {
            return Err(PixxelError::PlanLimit(
                "Free plan limited to 3 projects. Upgrade to Pro for unlimited projects."
                    .to_string(),
            ));
        }

        let now = now_ms();
        let id = Uuid::new_v4().to_string();
        data.projects.insert(
            id.clone(),
            Project {
                id: id.clone(),
                title: project.title,
                user_id: user_id.clone(),
                width: project.width,
                height: project.height,
                original_image_url: project.original_image_url,
                current_image_url: project.current_image_url,
                thumbnail_url: project.thumbnail_url,
                canvas_state: project.canvas_state,
                active_transformations: None,
                background_removed: false,
                created_at: now,
                updated_at: now,
            },
        );
        if let Some(user) = data.users.get_mut(&user_id) {
            user.projects_used += 1;
            user.last_active_at = now;
        }
        self.persist(&data).await?;
        tracing::info!(project_id = %id, %user_id, "Created project");
        Ok(id)
    }

    async fn get_project(&self, identity: Option<&Identity>, id: &str) -> Result<Option<Project>> {
        let data = self.data.read().await;
        let user_id = data.user_id_for(identity)?;
        match data.projects.get(id) {
            None => Ok(None),
            Some(p) if p.user_id != user_id => Err(PixxelError::AccessDenied),
            Some(p) => Ok(Some(p.clone())),
        }
    }

    async fn list_projects(&self, identity: Option<&Identity>) -> Result<Vec<Project>> {
        let data = self.data.read().await;
        let user_id = data.user_id_for(identity)?;
        let mut projects: Vec<Project> = data
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn update_project(
        &self,
        identity: Option<&Identity>,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project> {
        let mut data = self.data.write().await;
        let user_id = data.user_id_for(identity)?;
        let project = data.owned_project_mut(&user_id, id)?;
        patch.apply_to(project)?;
        // Keep updates strictly ordered even within one millisecond.
        project.updated_at = now_ms().max(project.updated_at + 1);
        let project = project.clone();
        self.persist(&data).await?;
        tracing::debug!(project_id = %id, "Updated project");
        Ok(project)
    }

    async fn delete_project(&self, identity: Option<&Identity>, id: &str) -> Result<bool> {
        let mut data = self.data.write().await;
        let user_id = data.user_id_for(identity)?;
        data.owned_project_mut(&user_id, id)?;
        data.projects.remove(id);
        if let Some(user) = data.users.get_mut(&user_id) {
            user.projects_used = user.projects_used.saturating_sub(1);
            user.last_active_at = now_ms();
        }
        self.persist(&data).await?;
        tracing::info!(project_id = %id, "Deleted project");
        Ok(true)
    }

    async fn record_export(&self, identity: Option<&Identity>) -> Result<User> {
        let mut data = self.data.write().await;
        let user_id = data.user_id_for(identity)?;
        let period = current_period();
        let user = data
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PixxelError::NotFound("User".to_string()))?;
        if user.export_period.as_deref() != Some(period.as_str()) {
            user.exports_this_month = 0;
            user.export_period = Some(period);
        }
        user.exports_this_month += 1;
        user.last_active_at = now_ms();
        let user = user.clone();
        self.persist(&data).await?;
        Ok(user)
    }
}
