use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::service::ServiceError;
use crate::store::StoreError;

/// Handler failures. Rendered as plain-text bodies; callers only see the
/// status code and message.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("not logged in")]
    Unauthenticated,
    #[error("empty request")]
    EmptyBody,
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("container service: {0}")]
    Service(#[from] ServiceError),
    #[error("profile store: {0}")]
    Store(#[from] StoreError),
    #[error("profile store task failed: {0}")]
    StoreTask(#[from] tokio::task::JoinError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthenticated
            | ProxyError::EmptyBody
            | ProxyError::MissingField(_)
            | ProxyError::UnknownAction(_) => StatusCode::BAD_REQUEST,
            ProxyError::Service(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Store(_) | ProxyError::StoreTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
