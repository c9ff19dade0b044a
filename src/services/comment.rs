use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{Comment, CommentDraft};

const RESOURCE: &str = "comment";

pub struct CommentService<'a> {
    api: &'a ApiClient,
}

fn comments_path(project_id: Uuid, task_id: Uuid) -> String {
    format!("projects/{project_id}/tasks/{task_id}/comments")
}

impl<'a> CommentService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        CommentService { api }
    }

    pub async fn list(&self, project_id: Uuid, task_id: Uuid) -> Result<Vec<Comment>, ClientError> {
        self.api
            .call(Method::GET, comments_path(project_id, task_id), "comments", "fetching")
            .send()
            .await
    }

    pub async fn create(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        draft: &CommentDraft,
    ) -> Result<Value, ClientError> {
        self.api
            .call(Method::POST, comments_path(project_id, task_id), RESOURCE, "creating")
            .json(draft)?
            .send()
            .await
    }

    pub async fn update(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
        draft: &CommentDraft,
    ) -> Result<Value, ClientError> {
        let path = format!("{}/{comment_id}", comments_path(project_id, task_id));
        self.api
            .call(Method::PUT, path, RESOURCE, "updating")
            .json(draft)?
            .send()
            .await
    }

    pub async fn delete(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Value, ClientError> {
        let path = format!("{}/{comment_id}", comments_path(project_id, task_id));
        self.api
            .call(Method::DELETE, path, RESOURCE, "deleting")
            .send()
            .await
    }
}
