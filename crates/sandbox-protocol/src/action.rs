//! Action names understood by the proxy's dispatch endpoint and the JSON
//! bodies it returns.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::record::SandboxRecord;

/// Form field selecting the handler.
pub const ACTION_FIELD: &str = "action";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Persist the connection data returned by a finished provisioning job.
    ConfigSave,
    /// Deprovision remotely (best effort) and forget the local record.
    Reset,
    /// Issue a token and the provisioning URL for the current user.
    Launch,
    /// Report the current user's unexpired record, if any.
    Status,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sandbox_config_cb" => Some(Action::ConfigSave),
            "sandbox_reset" => Some(Action::Reset),
            "sandbox_launch" => Some(Action::Launch),
            "sandbox_status" => Some(Action::Status),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ConfigSave => "sandbox_config_cb",
            Action::Reset => "sandbox_reset",
            Action::Launch => "sandbox_launch",
            Action::Status => "sandbox_status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LaunchInfo {
    /// `POST` target that starts provisioning for this user.
    pub provisioning_url: String,
    /// Short-lived authorization token, sent verbatim as `Authorization`.
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub sandbox: Option<SandboxRecord>,
}
