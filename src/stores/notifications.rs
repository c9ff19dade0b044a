//! Notification feed: newest-first list plus unread counter.
//!
//! The feed is seeded by one REST fetch and then fed by the push channel.
//! Read acknowledgements are optimistic: the local flip happens immediately
//! and the server call is fire-and-forget.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::http::ApiClient;
use crate::models::{Notification, NotificationStatus, NotificationType};
use crate::route::Route;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub items: Vec<Notification>,
    pub unread: usize,
}

#[derive(Clone)]
pub struct NotificationFeed {
    state: Arc<watch::Sender<FeedState>>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationFeed {
    pub fn new() -> Self {
        let (state, _) = watch::channel(FeedState::default());
        NotificationFeed {
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn unread(&self) -> usize {
        self.state.borrow().unread
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Replace the feed with a fetched list; the counter is recomputed.
    pub fn seed(&self, items: Vec<Notification>) {
        let unread = items.iter().filter(|n| n.is_unread()).count();
        self.state.send_replace(FeedState { items, unread });
    }

    /// Prepend a pushed notification. Only unread ones bump the counter.
    pub fn push(&self, notification: Notification) {
        self.state.send_modify(|feed| {
            if notification.is_unread() {
                feed.unread += 1;
            }
            feed.items.insert(0, notification);
        });
    }

    /// Flip one notification to read. Returns true only if it was unread;
    /// the counter drops by exactly one and never below zero.
    pub fn mark_read(&self, id: &str) -> bool {
        self.state.send_if_modified(|feed| {
            let Some(n) = feed.items.iter_mut().find(|n| n.id == id) else {
                return false;
            };
            if !n.is_unread() {
                return false;
            }
            n.status = NotificationStatus::Read;
            feed.unread = feed.unread.saturating_sub(1);
            true
        })
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.state.borrow().items.iter().find(|n| n.id == id).cloned()
    }

    pub fn clear(&self) {
        self.state.send_replace(FeedState::default());
    }
}

/// Where opening a notification takes the user.
pub fn target_of(notification: &Notification) -> Option<Route> {
    match notification.kind {
        NotificationType::TaskAssigned | NotificationType::CommentAdded => {
            match (notification.project_id, notification.task_id) {
                (Some(project_id), Some(task_id)) => Some(Route::Task { project_id, task_id }),
                (Some(project_id), None) => Some(Route::Project(project_id)),
                _ => None,
            }
        }
        NotificationType::ProjectInvitation => notification.project_id.map(Route::Project),
    }
}

/// Feed plus the REST side of read acknowledgement.
#[derive(Clone)]
pub struct NotificationCenter {
    api: ApiClient,
    feed: NotificationFeed,
}

impl NotificationCenter {
    pub fn new(api: ApiClient, feed: NotificationFeed) -> Self {
        NotificationCenter { api, feed }
    }

    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    /// Seed the feed from `GET /notifications`. On failure the feed is kept.
    pub async fn refresh(&self) -> Result<usize, crate::error::ClientError> {
        let items = self.api.notifications().list().await?;
        let count = items.len();
        self.feed.seed(items);
        Ok(count)
    }

    /// The user navigates into a notification's target. Marks it read
    /// locally right away, acknowledges it to the server in the background
    /// and returns where to go.
    pub fn open(&self, id: &str) -> Option<Route> {
        let notification = self.feed.get(id)?;
        if self.feed.mark_read(id) {
            let api = self.api.clone();
            let id = id.to_string();
            tokio::spawn(async move {
                match api.notifications().mark_read(&id).await {
                    Ok(()) => debug!(notification_id = %id, "marked read"),
                    Err(e) => warn!(notification_id = %id, error = %e, "mark read failed"),
                }
            });
        }
        target_of(&notification)
    }
}

// ── Tests ──────────────────────────────────────────────────────
