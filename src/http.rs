//! Authenticated JSON transport shared by every resource service.
//!
//! Contract: resolve a bearer token before anything else (no token, no
//! request), map non-2xx responses to `ClientError::Api` carrying the
//! resource/operation pair, and hand back the decoded payload untouched.

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;
use crate::services::{
    comment::CommentService, dashboard::DashboardService, invitation::InvitationService,
    member::MemberService, notification::NotificationService, project::ProjectService,
    task::TaskService, user::UserService,
};
use crate::session::Session;
use crate::settings::{parse_base, Settings};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(base: Url, session: Session) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base,
            session,
        }
    }

    pub fn from_settings(settings: &Settings, session: Session) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ClientError::Settings(e.to_string()))?;
        Ok(ApiClient {
            http,
            base: settings.api_base()?,
            session,
        })
    }

    /// Point at an arbitrary base, e.g. a test server.
    pub fn with_base(base: &str, session: Session) -> Result<Self, ClientError> {
        Ok(Self::new(parse_base(base)?, session))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn call(
        &self,
        method: Method,
        path: impl Into<String>,
        resource: &'static str,
        operation: &'static str,
    ) -> Call<'_> {
        Call {
            api: self,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            expect: None,
            authenticated: true,
            resource,
            operation,
        }
    }

    // ── Services ───────────────────────────────────────────────

    pub fn projects(&self) -> ProjectService<'_> {
        ProjectService::new(self)
    }

    pub fn members(&self) -> MemberService<'_> {
        MemberService::new(self)
    }

    pub fn tasks(&self) -> TaskService<'_> {
        TaskService::new(self)
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(self)
    }

    pub fn invitations(&self) -> InvitationService<'_> {
        InvitationService::new(self)
    }

    pub fn notifications(&self) -> NotificationService<'_> {
        NotificationService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }

    pub fn dashboard(&self) -> DashboardService<'_> {
        DashboardService::new(self)
    }
}

// ── One request ────────────────────────────────────────────────

pub(crate) struct Call<'a> {
    api: &'a ApiClient,
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    expect: Option<StatusCode>,
    authenticated: bool,
    resource: &'static str,
    operation: &'static str,
}

impl<'a> Call<'a> {
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ClientError> {
        let value =
            serde_json::to_value(body).map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Require one exact status instead of any 2xx.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expect = Some(status);
        self
    }

    /// Skip the bearer token. Only profile creation goes out this way.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Send and decode. An empty body decodes as JSON `null`, so `()` and
    /// `serde_json::Value` both work for bodiless responses.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let (resource, operation) = (self.resource, self.operation);
        let bytes = self.dispatch().await?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|source| ClientError::Decode {
            resource,
            operation,
            source,
        })
    }

    async fn dispatch(self) -> Result<Vec<u8>, ClientError> {
        let token = if self.authenticated {
            Some(self.api.session.token().await?)
        } else {
            None
        };

        let url = self
            .api
            .base
            .join(self.path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidInput(format!("bad path {}: {e}", self.path)))?;

        let mut request = self.api.http.request(self.method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        if let Some(body) = &self.body {
            request = request.json(body);
        }

        debug!(method = %self.method, path = %self.path, "request");
        let transport = |source| ClientError::Transport {
            resource: self.resource,
            operation: self.operation,
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let accepted = match self.expect {
            Some(expected) => status == expected,
            None => status.is_success(),
        };

        if !accepted {
            let body = response.text().await.unwrap_or_default();
            warn!(
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                "error {} {}",
                self.operation,
                self.resource
            );
            return Err(ClientError::Api {
                resource: self.resource,
                operation: self.operation,
                status,
                body,
            });
        }

        debug!(path = %self.path, status = status.as_u16(), "response");
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}
