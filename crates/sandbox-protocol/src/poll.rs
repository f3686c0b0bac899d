//! Container status polling vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `state` reported by the container status endpoint.
///
/// Matching is case-insensitive; unknown values are kept verbatim so they can
/// be surfaced in error output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Action,
    New,
    Building,
    Success,
    Other(String),
}

impl PollState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "action" => PollState::Action,
            "new" => PollState::New,
            "building" => PollState::Building,
            "success" => PollState::Success,
            _ => PollState::Other(raw.to_string()),
        }
    }

    /// Still provisioning; poll again after the interval.
    pub fn is_pending(&self) -> bool {
        matches!(self, PollState::Action | PollState::New | PollState::Building)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PollState::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PollState::Action => "action",
            PollState::New => "new",
            PollState::Building => "building",
            PollState::Success => "success",
            PollState::Other(raw) => raw,
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by `GET {poll_url}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl PollResponse {
    pub fn poll_state(&self) -> PollState {
        PollState::parse(&self.state)
    }
}

/// Lifecycle of one provisioning attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Requesting,
    Polling,
    Succeeded,
    Failed,
    /// Only reachable when the client is configured with a maximum wait.
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Failed | SessionState::TimedOut
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::Polling => "polling",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
            SessionState::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_states_match_case_insensitively() {
        for raw in ["action", "NEW", "Building"] {
            let state = PollState::parse(raw);
            assert!(state.is_pending(), "{raw} should be pending");
            assert!(!state.is_success());
        }
        assert!(PollState::parse("SUCCESS").is_success());
    }

    #[test]
    fn unknown_state_is_terminal_and_kept_verbatim() {
        let state = PollState::parse("Error");
        assert!(!state.is_pending());
        assert!(!state.is_success());
        assert_eq!(state.to_string(), "Error");
    }

    #[test]
    fn poll_response_data_is_optional() {
        let resp: PollResponse = serde_json::from_str(r#"{"state":"building"}"#).unwrap();
        assert_eq!(resp.poll_state(), PollState::Building);
        assert!(resp.data.is_none());

        let resp: PollResponse =
            serde_json::from_str(r#"{"state":"success","data":{"isc_port":"51773"}}"#).unwrap();
        assert_eq!(resp.data.unwrap()["isc_port"], "51773");
    }

    #[test]
    fn terminal_session_states() {
        assert!(!SessionState::Polling.is_terminal());
        assert!(SessionState::TimedOut.is_terminal());
        assert_eq!(SessionState::TimedOut.to_string(), "timed_out");
    }
}
