//! Debounced autosave.
//!
//! One consumer task per ready session reads [`SceneChange`] events. Each
//! mutation pushes the deadline out by the debounce window; when the window
//! elapses with no further mutation the scene is serialized and written to
//! the store. The write runs on its own task so a slow save never delays
//! the next deadline.
//!
//! The consumer holds only a weak reference to the surface. Closing the
//! channel (the surface drops its sender on dispose) ends the loop and any
//! pending deadline with it.
//!
//! Every successful write publishes the stored record on a watch channel so
//! the session can bring its own copy of the project up to date.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::store::{Identity, Project, ProjectPatch, ProjectStore};
use crate::surface::{GraphicsSurface, SceneChange};

/// Where and as whom saves are written.
#[derive(Clone)]
pub struct SaveTarget {
    pub store: Arc<dyn ProjectStore>,
    pub identity: Option<Identity>,
    pub project_id: String,
}

/// Running autosave consumer.
pub struct Autosave {
    task: JoinHandle<()>,
    saved: watch::Receiver<Option<Project>>,
}

impl Autosave {
    /// Start a consumer for `surface`. Returns the handle and the sender to
    /// attach to the surface.
    pub fn spawn(
        surface: Weak<Mutex<GraphicsSurface>>,
        target: SaveTarget,
        debounce: Duration,
    ) -> (Self, UnboundedSender<SceneChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (saved_tx, saved) = watch::channel(None);
        let task = tokio::spawn(run(rx, surface, target, saved_tx, debounce));
        (Self { task, saved }, tx)
    }

    /// The record written by the latest autosave, if one landed since the
    /// last call. A closed channel still yields its final value.
    pub fn take_saved(&mut self) -> Option<Project> {
        if !self.saved.has_changed().unwrap_or(true) {
            return None;
        }
        self.saved.borrow_and_update().clone()
    }

    /// Stop the consumer. A pending deadline is dropped without saving.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut rx: UnboundedReceiver<SceneChange>,
    surface: Weak<Mutex<GraphicsSurface>>,
    target: SaveTarget,
    saved: watch::Sender<Option<Project>>,
    debounce: Duration,
) {
    let mut deadline: Option<Instant> = None;
    loop {
        let wake = deadline.unwrap_or_else(Instant::now);
        tokio::select! {
            change = rx.recv() => match change {
                Some(change) if change.kind.is_mutation() => {
                    deadline = Some(Instant::now() + debounce);
                }
                Some(_) => {}
                None => {
                    if deadline.is_some() {
                        tracing::debug!(project_id = %target.project_id, "Pending autosave cancelled");
                    }
                    break;
                }
            },
            _ = sleep_until(wake), if deadline.is_some() => {
                deadline = None;
                tokio::spawn(save(surface.clone(), target.clone(), saved.clone()));
            }
        }
    }
}

/// Serialize the live scene and write it. Stale surfaces are skipped.
async fn save(
    surface: Weak<Mutex<GraphicsSurface>>,
    target: SaveTarget,
    saved: watch::Sender<Option<Project>>,
) {
    let Some(surface) = surface.upgrade() else {
        return;
    };
    let blob = {
        let guard = surface.lock().await;
        if !guard.is_live() {
            return;
        }
        guard.to_json()
    };
    drop(surface);

    let blob = match blob {
        Ok(blob) => blob,
        Err(e) => {
            tracing::error!(project_id = %target.project_id, error = %e, "Failed to serialize scene");
            return;
        }
    };

    match target
        .store
        .update_project(
            target.identity.as_ref(),
            &target.project_id,
            ProjectPatch::canvas(blob),
        )
        .await
    {
        Ok(project) => {
            tracing::debug!(project_id = %target.project_id, "Autosaved");
            // Nobody listening means the session is gone.
            let _ = saved.send(Some(project));
        }
        // The in-memory scene stays as it is.
        Err(e) => tracing::error!(project_id = %target.project_id, error = %e, "Autosave failed"),
    }
}
