use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sandbox_proxy::{ProxyConfig, ProxyState, serve};
use tokio::net::TcpListener;
use url::Url;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (env: SANDBOX_BIND)
    #[arg(long, env = "SANDBOX_BIND", default_value = "127.0.0.1:7780")]
    pub bind: SocketAddr,

    /// Base URL of the token/container service (env: SANDBOX_TOKEN_SERVICE)
    #[arg(long, env = "SANDBOX_TOKEN_SERVICE")]
    pub token_service: Url,

    /// SQLite profile database; profiles stay in memory when omitted (env: SANDBOX_DB)
    #[arg(long, env = "SANDBOX_DB")]
    pub database: Option<PathBuf>,

    /// Name of the session cookie (env: SANDBOX_SESSION_COOKIE)
    #[arg(
        long,
        env = "SANDBOX_SESSION_COOKIE",
        default_value = ProxyConfig::DEFAULT_SESSION_COOKIE
    )]
    pub session_cookie: String,

    /// Timeout for token/container service calls in milliseconds
    #[arg(long, env = "SANDBOX_HTTP_TIMEOUT_MS", default_value_t = 30_000)]
    pub http_timeout_ms: u64,

    /// Create this user and a login session for it on startup
    #[arg(long)]
    pub seed_user: Option<String>,

    /// Session token for --seed-user (random when omitted)
    #[arg(long, requires = "seed_user")]
    pub seed_session: Option<String>,
}

impl ServeArgs {
    fn proxy_config(&self) -> ProxyConfig {
        let mut config = ProxyConfig::new(self.token_service.clone());
        config.bind = self.bind;
        config.database = self.database.clone();
        config.session_cookie = self.session_cookie.clone();
        config.http_timeout = Duration::from_millis(self.http_timeout_ms);
        config
    }
}

pub async fn cmd_serve(args: ServeArgs) -> Result<()> {
    let config = args.proxy_config();
    let bind = config.bind;
    let cookie = config.session_cookie.clone();
    let state = ProxyState::from_config(config).context("initialize proxy")?;

    if let Some(email) = &args.seed_user {
        let user = state.store.put_user(email).context("seed user")?;
        let token = args
            .seed_session
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        state
            .store
            .put_session(&token, user.id)
            .context("seed session")?;
        tracing::info!(user = user.id, %email, "seeded session");
        println!("{cookie}={token}");
    }

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await
    .context("serve")
}
