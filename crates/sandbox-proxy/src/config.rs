use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Process-wide proxy settings, built once at startup and shared by reference
/// with every handler.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
    /// Base of the external token/container service; `authorize/{email}` and
    /// `containers/{email}` are resolved below it.
    pub token_service_base: Url,
    /// SQLite profile database. `None` keeps profiles in memory.
    pub database: Option<PathBuf>,
    /// Name of the cookie carrying the session token.
    pub session_cookie: String,
    /// Timeout for calls to the external service.
    pub http_timeout: Duration,
}

impl ProxyConfig {
    pub const DEFAULT_SESSION_COOKIE: &'static str = "sandbox_session";

    pub fn new(token_service_base: Url) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 7780)),
            token_service_base,
            database: None,
            session_cookie: Self::DEFAULT_SESSION_COOKIE.to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}
