use std::time::Duration;

use reqwest::StatusCode;
use sandbox_protocol::SessionState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("provisioning response carried no Location header")]
    MissingLocation,
    #[error("provisioning ended in state '{0}'")]
    UnexpectedState(String),
    #[error("provisioning succeeded without connection data")]
    MissingData,
    #[error("provisioning did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("a provisioning attempt is already {0}")]
    AlreadyStarted(SessionState),
}

impl ClientError {
    /// Short classification shown next to the message in the error block.
    pub fn status_text(&self) -> &'static str {
        match self {
            ClientError::Request { source, .. } if source.is_timeout() => "timeout",
            ClientError::Request { source, .. } if source.is_decode() => "parsererror",
            ClientError::TimedOut(_) => "timeout",
            ClientError::UnexpectedState(_) => "state",
            _ => "error",
        }
    }

    /// Message shown in the error block: the HTTP reason phrase when there is
    /// one, otherwise the full error.
    pub fn error_text(&self) -> String {
        match self {
            ClientError::Status { status, .. } => status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string()),
            other => other.to_string(),
        }
    }
}
