use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{MemberRole, ProjectMember};

const RESOURCE: &str = "project member";

pub struct MemberService<'a> {
    api: &'a ApiClient,
}

impl<'a> MemberService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        MemberService { api }
    }

    /// The viewer's own membership in a project.
    pub async fn current(&self, project_id: Uuid) -> Result<ProjectMember, ClientError> {
        self.api
            .call(
                Method::GET,
                format!("projects/{project_id}/project-member"),
                RESOURCE,
                "fetching",
            )
            .send()
            .await
    }

    pub async fn update_role(
        &self,
        project_id: Uuid,
        member_id: Uuid,
        role: MemberRole,
    ) -> Result<Value, ClientError> {
        self.api
            .call(
                Method::PUT,
                format!("projects/{project_id}/project-members/{member_id}"),
                RESOURCE,
                "updating",
            )
            .json(&json!({ "role": role }))?
            .send()
            .await
    }
}
