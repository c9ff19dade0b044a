use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{parse_id, CreateProject, Project, ProjectSummary, UpdateProject};

const RESOURCE: &str = "project";

pub struct ProjectService<'a> {
    api: &'a ApiClient,
}

impl<'a> ProjectService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        ProjectService { api }
    }

    // GET /projects
    pub async fn list(&self) -> Result<Vec<Project>, ClientError> {
        self.api
            .call(Method::GET, "projects", "projects", "fetching")
            .send()
            .await
    }

    /// GET /projects/{id}. The id is format-checked before the token is even
    /// requested; a malformed id never reaches the network.
    pub async fn get(&self, project_id: &str) -> Result<Project, ClientError> {
        let id = parse_id(RESOURCE, project_id)?;
        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Project, ClientError> {
        self.api
            .call(Method::GET, format!("projects/{id}"), RESOURCE, "fetching")
            .send()
            .await
    }

    // POST /projects
    pub async fn create(&self, project: &CreateProject) -> Result<Project, ClientError> {
        if project.name.trim().is_empty() {
            return Err(ClientError::InvalidInput("Project name is required".into()));
        }
        self.api
            .call(Method::POST, "projects", RESOURCE, "creating")
            .json(project)?
            .send()
            .await
    }

    // PUT /projects/{id}
    pub async fn update(&self, id: Uuid, project: &UpdateProject) -> Result<Value, ClientError> {
        self.api
            .call(Method::PUT, format!("projects/{id}"), RESOURCE, "updating")
            .json(project)?
            .send()
            .await
    }

    // DELETE /projects/{id}
    pub async fn delete(&self, id: Uuid) -> Result<Value, ClientError> {
        self.api
            .call(Method::DELETE, format!("projects/{id}"), RESOURCE, "deleting")
            .send()
            .await
    }

    // POST /projects/{id}/leave
    pub async fn leave(&self, id: Uuid) -> Result<Value, ClientError> {
        self.api
            .call(Method::POST, format!("projects/{id}/leave"), RESOURCE, "leaving")
            .json(&serde_json::json!({}))?
            .send()
            .await
    }

    /// Name of a project the viewer was invited to join by link.
    pub async fn join_info(&self, project_id: &str) -> Result<ProjectSummary, ClientError> {
        let id = parse_id(RESOURCE, project_id)?;
        self.api
            .call(Method::GET, format!("projects/{id}/join"), RESOURCE, "fetching")
            .send()
            .await
    }

    // POST /projects/{id}/join
    pub async fn join(&self, project_id: &str) -> Result<Value, ClientError> {
        let id = parse_id(RESOURCE, project_id)?;
        self.api
            .call(Method::POST, format!("projects/{id}/join"), RESOURCE, "joining")
            .json(&serde_json::json!({}))?
            .send()
            .await
    }
}
