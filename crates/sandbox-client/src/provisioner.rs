//! The provisioning state machine.
//!
//! ```text
//! idle -> requesting -> polling -(pending, sleep interval)-> polling
//!                 \            \-> succeeded (save + reload)
//!                  \            \-> failed | timed_out
//!                   \-> failed
//! ```
//!
//! Polls are strictly sequential: the next request is only issued once the
//! previous one settled and the fixed interval elapsed. There is no backoff.
//! Dropping the `launch` future is the only way to stop a running attempt;
//! the session is then back to `idle`.

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, LOCATION};
use sandbox_protocol::{PollResponse, PollState, SessionState};
use serde_json::{Map, Value};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::proxy::ProxyClient;
use crate::ui::ProvisioningUi;

pub const RESET_PROMPT: &str =
    "Delete your sandbox? You will lose any code and data you created.";

/// In-memory view of one provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningSession {
    pub state: SessionState,
    /// Set once the provisioning request returned a `Location`.
    pub status_poll_url: Option<Url>,
    pub authorization_token: Option<String>,
}

impl Default for ProvisioningSession {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            status_poll_url: None,
            authorization_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The user declined the confirmation.
    Declined,
    Reset,
    /// The proxy call failed; only logged.
    Failed,
}

pub struct Provisioner<U: ProvisioningUi> {
    http: Client,
    proxy: ProxyClient,
    config: ClientConfig,
    ui: U,
    session: ProvisioningSession,
}

impl<U: ProvisioningUi> Provisioner<U> {
    pub fn new(config: ClientConfig, ui: U) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::Build)?;
        let proxy = ProxyClient::new(http.clone(), config.ajax_url.clone(), config.cookie.clone());
        Ok(Self {
            http,
            proxy,
            config,
            ui,
            session: ProvisioningSession::default(),
        })
    }

    pub fn session(&self) -> &ProvisioningSession {
        &self.session
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn proxy(&self) -> &ProxyClient {
        &self.proxy
    }

    /// Runs one provisioning attempt to a terminal state.
    ///
    /// Allowed from `idle` and, as a retry, from `failed` or `timed_out`.
    /// Failures are rendered through [`ProvisioningUi::show_error`] and also
    /// returned. Dropping the future before it settles puts the session back
    /// to `idle`.
    pub async fn launch(&mut self, provisioning_url: &str, token: &str) -> Result<(), ClientError> {
        match self.session.state {
            SessionState::Idle | SessionState::Failed | SessionState::TimedOut => {}
            other => return Err(ClientError::AlreadyStarted(other)),
        }
        if token.is_empty() {
            warn!("launch: empty authorization token");
        }

        let Self {
            http,
            proxy,
            config,
            ui,
            session,
        } = self;
        let mut attempt = Attempt::begin(session, token);
        ui.show_waiting();

        let outcome = run(http, config, &mut *attempt.session, provisioning_url, token).await;
        match outcome {
            Ok(data) => {
                attempt.settle(SessionState::Succeeded);
                info!("polling done, saving config info");

                // Fire-and-forget: a failed save is only logged.
                match proxy.save_config(&data).await {
                    Ok(()) => {
                        info!("sandbox config saved");
                        ui.reload();
                    }
                    Err(err) => warn!("sandbox config save failed: {err}"),
                }
                Ok(())
            }
            Err(err) => {
                let state = match err {
                    ClientError::TimedOut(_) => SessionState::TimedOut,
                    _ => SessionState::Failed,
                };
                attempt.settle(state);
                warn!(%state, "provisioning failed: {err}");
                ui.show_error(err.status_text(), &err.error_text());
                Err(err)
            }
        }
    }

    /// Deletes the sandbox after confirmation. Failures are logged, not shown.
    pub async fn reset(&mut self) -> ResetOutcome {
        if !self.ui.confirm(RESET_PROMPT) {
            return ResetOutcome::Declined;
        }
        match self.proxy.reset().await {
            Ok(()) => {
                info!("sandbox reset successful");
                self.session = ProvisioningSession::default();
                self.ui.reload();
                ResetOutcome::Reset
            }
            Err(err) => {
                warn!("sandbox reset request failed: {err}");
                ResetOutcome::Failed
            }
        }
    }
}

/// One in-flight attempt. Dropped before it reaches a terminal state, it
/// resets the session to idle.
struct Attempt<'a> {
    session: &'a mut ProvisioningSession,
}

impl<'a> Attempt<'a> {
    fn begin(session: &'a mut ProvisioningSession, token: &str) -> Self {
        *session = ProvisioningSession {
            state: SessionState::Requesting,
            status_poll_url: None,
            authorization_token: Some(token.to_string()),
        };
        Self { session }
    }

    fn settle(self, state: SessionState) {
        self.session.state = state;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.session.state.is_terminal() {
            info!(state = %self.session.state, "provisioning attempt abandoned");
            *self.session = ProvisioningSession::default();
        }
    }
}

async fn run(
    http: &Client,
    config: &ClientConfig,
    session: &mut ProvisioningSession,
    provisioning_url: &str,
    token: &str,
) -> Result<Map<String, Value>, ClientError> {
    let poll_url = request(http, provisioning_url, token).await?;
    info!(%poll_url, "got polling url");
    session.status_poll_url = Some(poll_url.clone());
    session.state = SessionState::Polling;
    poll_until_done(http, config, &poll_url, token).await
}

async fn request(http: &Client, provisioning_url: &str, token: &str) -> Result<Url, ClientError> {
    let base = Url::parse(provisioning_url).map_err(|source| ClientError::InvalidUrl {
        url: provisioning_url.to_string(),
        source,
    })?;
    let resp = http
        .post(base.clone())
        .header(AUTHORIZATION, token)
        .send()
        .await
        .map_err(|source| ClientError::Request {
            url: provisioning_url.to_string(),
            source,
        })?;
    if !resp.status().is_success() {
        return Err(ClientError::Status {
            url: provisioning_url.to_string(),
            status: resp.status(),
        });
    }
    let location = resp
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ClientError::MissingLocation)?;
    base.join(location).map_err(|source| ClientError::InvalidUrl {
        url: location.to_string(),
        source,
    })
}

async fn poll_until_done(
    http: &Client,
    config: &ClientConfig,
    poll_url: &Url,
    token: &str,
) -> Result<Map<String, Value>, ClientError> {
    let started = Instant::now();
    loop {
        let resp = poll_once(http, poll_url, token).await?;
        let state = resp.poll_state();
        debug!(%state, "polling response");

        match state {
            PollState::Success => return resp.data.ok_or(ClientError::MissingData),
            state if state.is_pending() => {
                if let Some(max_wait) = config.max_wait {
                    if started.elapsed() + config.poll_interval > max_wait {
                        return Err(ClientError::TimedOut(max_wait));
                    }
                }
                sleep(config.poll_interval).await;
            }
            other => return Err(ClientError::UnexpectedState(other.to_string())),
        }
    }
}

async fn poll_once(http: &Client, poll_url: &Url, token: &str) -> Result<PollResponse, ClientError> {
    let url = poll_url.to_string();
    let resp = http
        .get(poll_url.clone())
        .header(AUTHORIZATION, token)
        .send()
        .await
        .map_err(|source| ClientError::Request {
            url: url.clone(),
            source,
        })?;
    if !resp.status().is_success() {
        return Err(ClientError::Status {
            url,
            status: resp.status(),
        });
    }
    resp.json::<PollResponse>()
        .await
        .map_err(|source| ClientError::Request { url, source })
}
