//! Server side of sandbox provisioning.
//!
//! An action-dispatch endpoint (`POST /wp-admin/admin-ajax.php`) routes to the
//! persist, reset, launch and status handlers. Handlers check authentication
//! themselves; the dispatch layer only resolves the optional session.

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::{ProxyState, router, serve};
pub use service::{ContainerService, HttpContainerService, ServiceError};
pub use store::{
    DynProfileStore, MemProfileStore, ProfileStore, SqliteProfileStore, StoreError, User,
};
