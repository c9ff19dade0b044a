use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{Comment, CommentDraft};

/// Comment list of one task. Every mutation is followed by a full refetch;
/// a failed call leaves the list exactly as it was.
pub struct CommentThread {
    api: ApiClient,
    project_id: Uuid,
    task_id: Uuid,
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(api: ApiClient, project_id: Uuid, task_id: Uuid) -> Self {
        CommentThread {
            api,
            project_id,
            task_id,
            comments: Vec::new(),
        }
    }

    /// Oldest first, as the backend returns them.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Display order: newest on top.
    pub fn newest_first(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().rev()
    }

    pub async fn refresh(&mut self) -> Result<&[Comment], ClientError> {
        let comments = self.api.comments().list(self.project_id, self.task_id).await?;
        debug!(task_id = %self.task_id, count = comments.len(), "comments refreshed");
        self.comments = comments;
        Ok(&self.comments)
    }

    fn draft(text: &str) -> Result<CommentDraft, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidInput("Comment cannot be empty".into()));
        }
        Ok(CommentDraft { comment: text.to_string() })
    }

    pub async fn post(&mut self, text: &str) -> Result<(), ClientError> {
        let draft = Self::draft(text)?;
        self.api
            .comments()
            .create(self.project_id, self.task_id, &draft)
            .await?;
        info!(task_id = %self.task_id, "comment posted");
        self.refresh().await.map(|_| ())
    }

    pub async fn edit(&mut self, comment_id: Uuid, text: &str) -> Result<(), ClientError> {
        let draft = Self::draft(text)?;
        self.api
            .comments()
            .update(self.project_id, self.task_id, comment_id, &draft)
            .await?;
        info!(task_id = %self.task_id, %comment_id, "comment edited");
        self.refresh().await.map(|_| ())
    }

    pub async fn delete(&mut self, comment_id: Uuid) -> Result<(), ClientError> {
        self.api
            .comments()
            .delete(self.project_id, self.task_id, comment_id)
            .await?;
        info!(task_id = %self.task_id, %comment_id, "comment deleted");
        self.refresh().await.map(|_| ())
    }
}

// ── Tests ──────────────────────────────────────────────────────
