//! The project currently being viewed.
//!
//! The aggregate is an immutable `Arc<Project>` swapped wholesale on every
//! load; nothing patches it field by field. A generation counter makes sure
//! only the newest `load` gets to apply its result.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{parse_id, MemberRole, Project, ProjectMember};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied(Arc<Project>),
    /// A newer load started while this one was in flight; its result was
    /// dropped on the floor.
    Superseded,
}

pub struct ProjectStore {
    api: ApiClient,
    current: watch::Sender<Option<Arc<Project>>>,
    /// True while the newest load is in flight.
    loading: watch::Sender<bool>,
    generation: AtomicU64,
}

impl ProjectStore {
    pub fn new(api: ApiClient) -> Self {
        let (current, _) = watch::channel(None);
        let (loading, _) = watch::channel(false);
        ProjectStore {
            api,
            current,
            loading,
            generation: AtomicU64::new(0),
        }
    }

    pub fn project(&self) -> Option<Arc<Project>> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Project>>> {
        self.current.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Fetch and install a project. Rejects a malformed id before any network
    /// call. On failure the held aggregate is left as it was.
    pub async fn load(&self, project_id: &str) -> Result<LoadOutcome, ClientError> {
        let id = parse_id("project", project_id)?;
        self.load_id(id).await
    }

    async fn load_id(&self, id: Uuid) -> Result<LoadOutcome, ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.send_replace(true);

        let fetched = self.api.projects().get_by_id(id).await;
        // only the newest load owns the flag
        if self.is_current(generation) {
            self.loading.send_replace(false);
        }

        let project = match fetched {
            Ok(project) => Arc::new(project),
            Err(e) => {
                warn!(project_id = %id, error = %e, "project load failed");
                return Err(e);
            }
        };

        if !self.is_current(generation) {
            debug!(project_id = %id, generation, "discarding superseded project load");
            return Ok(LoadOutcome::Superseded);
        }

        info!(project_id = %id, tasks = project.tasks.len(), "project loaded");
        self.current.send_replace(Some(project.clone()));
        Ok(LoadOutcome::Applied(project))
    }

    /// Reload the held project. `Ok(None)` when nothing is loaded.
    pub async fn refetch(&self) -> Result<Option<LoadOutcome>, ClientError> {
        let held = self.current.borrow().as_ref().map(|p| p.id);
        let Some(id) = held else {
            return Ok(None);
        };
        self.load_id(id).await.map(Some)
    }

    /// Route exit. Also invalidates any load still in flight.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.loading.send_replace(false);
        self.current.send_replace(None);
    }

    pub fn resolve_member(&self, member_id: Uuid) -> Option<ProjectMember> {
        self.current
            .borrow()
            .as_ref()
            .and_then(|p| p.member(member_id).cloned())
    }

    /// The viewer's own membership, matched by backend user id.
    pub fn viewer(&self) -> Option<ProjectMember> {
        let user_id = self.api.session().user_id()?;
        self.current
            .borrow()
            .as_ref()
            .and_then(|p| p.member_for_user(user_id).cloned())
    }

    pub fn is_owner(&self) -> bool {
        self.viewer().is_some_and(|m| m.role == MemberRole::Owner)
    }

    pub fn can_edit(&self) -> bool {
        self.viewer().is_some_and(|m| m.role.can_write())
    }
}
