//! Options shared by the client-side commands.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use sandbox_client::ClientConfig;
use sandbox_proxy::ProxyConfig;
use url::Url;

#[derive(Args, Debug, Clone)]
pub struct ClientOpts {
    /// Proxy action-dispatch endpoint (env: SANDBOX_PROXY_URL)
    #[arg(
        long,
        env = "SANDBOX_PROXY_URL",
        default_value = "http://127.0.0.1:7780/wp-admin/admin-ajax.php"
    )]
    pub proxy: Url,

    /// Login session token (env: SANDBOX_SESSION)
    #[arg(long, env = "SANDBOX_SESSION")]
    pub session: Option<String>,

    /// Name of the session cookie (env: SANDBOX_SESSION_COOKIE)
    #[arg(
        long,
        env = "SANDBOX_SESSION_COOKIE",
        default_value = ProxyConfig::DEFAULT_SESSION_COOKIE
    )]
    pub session_cookie: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClientOpts {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let Some(session) = self.session.as_deref() else {
            bail!("no session given; pass --session or set SANDBOX_SESSION");
        };
        let mut config = ClientConfig::new(self.proxy.clone())
            .with_cookie(format!("{}={}", self.session_cookie, session));
        config.request_timeout = Duration::from_millis(self.timeout_ms);
        Ok(config)
    }
}
