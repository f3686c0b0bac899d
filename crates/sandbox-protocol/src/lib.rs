//! Shared sandbox provisioning types used by the client and the proxy.

pub mod action;
pub mod poll;
pub mod record;
pub mod sanitize;

pub use action::{ACTION_FIELD, Action, LaunchInfo, StatusResponse};
pub use poll::{PollResponse, PollState, SessionState};
pub use record::{
    EXPIRES_META_KEY, SANDBOX_TTL_SECS, SandboxConnection, SandboxField, SandboxRecord,
    format_expiry, parse_expiry,
};
pub use sanitize::sanitize_text_field;
