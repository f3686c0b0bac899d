use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use sandbox_protocol::{
    ACTION_FIELD, Action, LaunchInfo, SandboxConnection, SandboxRecord, StatusResponse,
    sanitize_text_field,
};
use tracing::{info, warn};
use url::form_urlencoded;
use utoipa::OpenApi;

use crate::error::ProxyError;
use crate::http::ProxyState;
use crate::service::ContainerService;
use crate::store::User;

#[derive(OpenApi)]
#[openapi(
    paths(dispatch, health),
    components(schemas(LaunchInfo, StatusResponse, SandboxRecord, SandboxConnection))
)]
pub struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(openapi())
}

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Proxy is up")))]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Action-dispatch endpoint.
///
/// The `action` form field selects the handler. Authentication is checked by
/// each handler, not here.
#[utoipa::path(
    post,
    path = "/wp-admin/admin-ajax.php",
    request_body(
        content = String,
        content_type = "application/x-www-form-urlencoded",
        description = "`action` plus handler fields"
    ),
    responses(
        (status = 200, description = "Handled; `sandbox_launch` returns LaunchInfo, `sandbox_status` returns StatusResponse"),
        (status = 400, description = "Not logged in, empty or incomplete request, or unknown action", body = String),
        (status = 502, description = "Token service failure", body = String)
    )
)]
pub async fn dispatch(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let form: HashMap<String, String> = form_urlencoded::parse(&body).into_owned().collect();
    let result = match form.get(ACTION_FIELD).map(String::as_str) {
        Some(raw) => match Action::parse(raw) {
            Some(action) => handle(&state, action, &headers, &form).await,
            None => Err(ProxyError::UnknownAction(raw.to_string())),
        },
        None => Err(ProxyError::UnknownAction(String::new())),
    };
    match result {
        Ok(resp) => resp,
        Err(err) => {
            if err.status().is_server_error() {
                warn!("dispatch failed: {err}");
            }
            err.into_response()
        }
    }
}

async fn handle(
    state: &ProxyState,
    action: Action,
    headers: &HeaderMap,
    form: &HashMap<String, String>,
) -> Result<Response, ProxyError> {
    let user = state.current_user(headers).await?;
    match action {
        Action::ConfigSave => persist(state, user, form).await,
        Action::Reset => reset(state, user).await,
        Action::Launch => launch(state, user).await,
        Action::Status => status(state, user).await,
    }
}

/// Stores the connection data of a finished provisioning job.
///
/// Every field is sanitized as plain text. The expiry is always one hour from
/// now; a lease reported by the backend is ignored.
async fn persist(
    state: &ProxyState,
    user: Option<User>,
    form: &HashMap<String, String>,
) -> Result<Response, ProxyError> {
    let user = user.ok_or(ProxyError::Unauthenticated)?;
    if form.keys().all(|key| key == ACTION_FIELD) {
        return Err(ProxyError::EmptyBody);
    }
    let connection = SandboxConnection::from_lookup(|field| form.get(field.key()).cloned())
        .map_err(|field| ProxyError::MissingField(field.key()))?
        .map_values(sanitize_text_field);

    let record = SandboxRecord::new_at(connection, state.clock.now());
    let expires = record.expires;
    let user_id = user.id;
    state
        .store_call(move |store| store.put_sandbox(user_id, &record))
        .await?;
    info!(user = user_id, %expires, "sandbox record saved");
    Ok((StatusCode::OK, "saved").into_response())
}

/// Forgets the user's sandbox. The remote deprovision is best effort and never
/// blocks the local delete.
async fn reset(state: &ProxyState, user: Option<User>) -> Result<Response, ProxyError> {
    let user = user.ok_or(ProxyError::Unauthenticated)?;
    best_effort_deprovision(state.service.as_ref(), &user.email).await;
    let user_id = user.id;
    state
        .store_call(move |store| store.delete_sandbox(user_id))
        .await?;
    info!(user = user.id, "sandbox record deleted");
    Ok((StatusCode::OK, "reset").into_response())
}

/// Not transactional: failures are logged and dropped, local state is cleared
/// regardless.
async fn best_effort_deprovision(service: &dyn ContainerService, email: &str) {
    let token = match service.authorize(email).await {
        Ok(token) => token,
        Err(err) => {
            warn!("deprovision skipped, no token: {err}");
            return;
        }
    };
    if let Err(err) = service.delete_container(email, &token).await {
        warn!("deprovision failed: {err}");
    }
}

async fn launch(state: &ProxyState, user: Option<User>) -> Result<Response, ProxyError> {
    let user = user.ok_or(ProxyError::Unauthenticated)?;
    let token = state.service.authorize(&user.email).await?;
    let info = LaunchInfo {
        provisioning_url: state.service.containers_url(&user.email).to_string(),
        token,
    };
    Ok(Json(info).into_response())
}

/// Current record, or `null` when absent, partial or expired.
async fn status(state: &ProxyState, user: Option<User>) -> Result<Response, ProxyError> {
    let user_id = user.ok_or(ProxyError::Unauthenticated)?.id;
    let now = state.clock.now();
    let sandbox = state
        .store_call(move |store| store.get_sandbox(user_id))
        .await?
        .filter(|record| !record.is_expired_at(now));
    Ok(Json(StatusResponse { sandbox }).into_response())
}
