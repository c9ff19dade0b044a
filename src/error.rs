//! Client error taxonomy.
//!
//! Every failure maps to one of four user-facing dispositions: redirect to
//! login, toast then redirect, toast, or nothing at all.

use reqwest::StatusCode;
use thiserror::Error;

use crate::route::Route;
use crate::stores::task_modal::ModalError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No identity, or the identity provider could not mint a token.
    #[error("No authentication token available. Please log in.")]
    NotAuthenticated,

    /// A malformed identifier, caught before any request is issued.
    #[error("Invalid {what} ID")]
    InvalidId { what: &'static str, value: String },

    /// Client-side form validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Non-2xx response. Displays as the toast text, e.g. `error updating task`.
    #[error("error {operation} {resource}")]
    Api {
        resource: &'static str,
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("error {operation} {resource}: {source}")]
    Transport {
        resource: &'static str,
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("error {operation} {resource}: unexpected response ({source})")]
    Decode {
        resource: &'static str,
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Modal(#[from] ModalError),

    #[error("push channel: {0}")]
    Channel(String),

    #[error("preferences: {0}")]
    Prefs(String),

    #[error("settings: {0}")]
    Settings(String),
}

/// What the UI layer does with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    RedirectToLogin,
    ToastThenRedirect(Route),
    Toast,
    Silent,
}

impl ClientError {
    pub fn disposition(&self) -> Disposition {
        match self {
            ClientError::NotAuthenticated => Disposition::RedirectToLogin,
            ClientError::Api { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                Disposition::RedirectToLogin
            }
            ClientError::InvalidId { what: "project", .. } => {
                Disposition::ToastThenRedirect(Route::Projects)
            }
            ClientError::InvalidId { .. } => Disposition::ToastThenRedirect(Route::Dashboard),
            ClientError::Channel(_) => Disposition::Silent,
            ClientError::InvalidInput(_)
            | ClientError::Api { .. }
            | ClientError::Transport { .. }
            | ClientError::Decode { .. }
            | ClientError::Modal(_)
            | ClientError::Prefs(_)
            | ClientError::Settings(_) => Disposition::Toast,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Channel(e.to_string())
    }
}
