use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{Task, TaskForm};

const RESOURCE: &str = "task";

pub struct TaskService<'a> {
    api: &'a ApiClient,
}

impl<'a> TaskService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        TaskService { api }
    }

    // POST /projects/{project}/tasks
    pub async fn create(&self, project_id: Uuid, form: &TaskForm) -> Result<Value, ClientError> {
        form.validate()?;
        self.api
            .call(
                Method::POST,
                format!("projects/{project_id}/tasks"),
                RESOURCE,
                "creating",
            )
            .json(form)?
            .send()
            .await
    }

    // GET /projects/{project}/tasks/{task}
    pub async fn get(&self, project_id: Uuid, task_id: Uuid) -> Result<Task, ClientError> {
        self.api
            .call(
                Method::GET,
                format!("projects/{project_id}/tasks/{task_id}"),
                RESOURCE,
                "fetching",
            )
            .send()
            .await
    }

    // PUT /projects/{project}/tasks/{task}
    pub async fn update(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        form: &TaskForm,
    ) -> Result<Value, ClientError> {
        form.validate()?;
        self.api
            .call(
                Method::PUT,
                format!("projects/{project_id}/tasks/{task_id}"),
                RESOURCE,
                "updating",
            )
            .json(form)?
            .send()
            .await
    }

    // DELETE /projects/{project}/tasks/{task}
    pub async fn delete(&self, project_id: Uuid, task_id: Uuid) -> Result<Value, ClientError> {
        self.api
            .call(
                Method::DELETE,
                format!("projects/{project_id}/tasks/{task_id}"),
                RESOURCE,
                "deleting",
            )
            .send()
            .await
    }
}
