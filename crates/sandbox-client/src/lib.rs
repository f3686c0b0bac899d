//! Client side of sandbox provisioning.
//!
//! [`Provisioner`] drives one provisioning attempt against the external
//! container service: request, sequential polling, then handing the returned
//! connection data to the proxy. [`ProxyClient`] talks to the proxy's
//! action-dispatch endpoint.

pub mod config;
pub mod error;
pub mod provisioner;
pub mod proxy;
pub mod ui;

pub use config::ClientConfig;
pub use error::ClientError;
pub use provisioner::{ProvisioningSession, Provisioner, RESET_PROMPT, ResetOutcome};
pub use proxy::ProxyClient;
pub use ui::ProvisioningUi;
