use std::time::Duration;

use url::Url;

/// Settings for one provisioning client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Proxy action-dispatch endpoint.
    pub ajax_url: Url,
    /// Delay between a settled poll and the next one.
    pub poll_interval: Duration,
    /// Upper bound on time spent polling. `None` polls until a terminal state.
    pub max_wait: Option<Duration>,
    /// Per-request timeout for every HTTP call.
    pub request_timeout: Duration,
    /// Raw `Cookie` header identifying the proxy session.
    pub cookie: Option<String>,
}

impl ClientConfig {
    pub fn new(ajax_url: Url) -> Self {
        Self {
            ajax_url,
            poll_interval: Duration::from_millis(2000),
            max_wait: None,
            request_timeout: Duration::from_secs(30),
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}
