use reqwest::{Method, StatusCode};

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{CreateUserRequest, User};

const RESOURCE: &str = "user";

pub struct UserService<'a> {
    api: &'a ApiClient,
}

impl<'a> UserService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        UserService { api }
    }

    /// Create the backend profile for a freshly signed-up identity.
    /// Unauthenticated, and only `201 Created` counts as success.
    pub async fn create(&self, request: &CreateUserRequest) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .api
            .call(Method::POST, "users/create", RESOURCE, "creating")
            .anonymous()
            .json(request)?
            .expect_status(StatusCode::CREATED)
            .send()
            .await?;
        Ok(())
    }

    // GET /users/me
    pub async fn current(&self) -> Result<User, ClientError> {
        self.api
            .call(Method::GET, "users/me", RESOURCE, "fetching")
            .send()
            .await
    }

    // GET /users/search?query=
    pub async fn search(&self, query: &str) -> Result<Vec<User>, ClientError> {
        self.api
            .call(Method::GET, "users/search", "users", "searching")
            .query("query", query)
            .send()
            .await
    }
}
