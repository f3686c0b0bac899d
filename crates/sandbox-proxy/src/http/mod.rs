pub mod api;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::clock::{Clock, SystemClock};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::service::{ContainerService, HttpContainerService};
use crate::store::{
    DynProfileStore, MemProfileStore, ProfileStore, SqliteProfileStore, StoreResult, User,
};

/// Shared, immutable handler context.
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<ProxyConfig>,
    pub store: DynProfileStore,
    pub service: Arc<dyn ContainerService>,
    pub clock: Arc<dyn Clock>,
}

impl ProxyState {
    pub fn new(
        config: ProxyConfig,
        store: DynProfileStore,
        service: Arc<dyn ContainerService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            service,
            clock,
        }
    }

    /// Production wiring: SQLite (or in-memory) profiles, the HTTP container
    /// service and the system clock.
    pub fn from_config(config: ProxyConfig) -> Result<Self, ProxyError> {
        let store: DynProfileStore = match &config.database {
            Some(path) => Arc::new(SqliteProfileStore::open(path)?),
            None => Arc::new(MemProfileStore::new()),
        };
        let service =
            HttpContainerService::new(config.token_service_base.clone(), config.http_timeout)?;
        Ok(Self::new(
            config,
            store,
            Arc::new(service),
            Arc::new(SystemClock),
        ))
    }

    /// Resolves the session cookie to a user. A missing or unknown session is
    /// not an error here; handlers decide whether they need one.
    pub async fn current_user(&self, headers: &HeaderMap) -> Result<Option<User>, ProxyError> {
        let Some(token) = session_token(headers, &self.config.session_cookie) else {
            return Ok(None);
        };
        let token = token.to_string();
        self.store_call(move |store| store.user_for_session(&token))
            .await
    }

    /// Runs a profile store call on the blocking pool. The SQLite backend
    /// holds a `std::sync::Mutex` across file I/O.
    pub async fn store_call<T, F>(&self, f: F) -> Result<T, ProxyError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ProfileStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || f(store.as_ref())).await?;
        Ok(result?)
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/openapi.json", get(api::openapi_json))
        .route("/wp-admin/admin-ajax.php", post(api::dispatch))
        .route("/ajax", post(api::dispatch))
        .with_state(state)
}

pub async fn serve(
    listener: TcpListener,
    state: ProxyState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("sandbox proxy listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
