use reqwest::{Method, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{Invitation, InvitationAnswer, InvitationResponse, InviteRequest};

const RESOURCE: &str = "invitation";

pub struct InvitationService<'a> {
    api: &'a ApiClient,
}

impl<'a> InvitationService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        InvitationService { api }
    }

    /// Invitations addressed to the viewer.
    pub async fn list(&self) -> Result<Vec<Invitation>, ClientError> {
        self.api
            .call(Method::GET, "invitations", "invitations", "fetching")
            .send()
            .await
    }

    /// Only a `201 Created` counts as success.
    pub async fn invite(&self, project_id: Uuid, user_id: Uuid) -> Result<Value, ClientError> {
        let request = InviteRequest {
            invited_user_id: user_id,
            project_id,
        };
        self.api
            .call(Method::POST, "invitations", RESOURCE, "creating")
            .json(&request)?
            .expect_status(StatusCode::CREATED)
            .send()
            .await
    }

    pub async fn respond(
        &self,
        invitation_id: Uuid,
        project_id: Uuid,
        answer: InvitationAnswer,
    ) -> Result<Value, ClientError> {
        let body = InvitationResponse {
            status: answer,
            project_id,
        };
        self.api
            .call(
                Method::PUT,
                format!("invitations/{invitation_id}"),
                RESOURCE,
                "responding to",
            )
            .json(&body)?
            .send()
            .await
    }
}
