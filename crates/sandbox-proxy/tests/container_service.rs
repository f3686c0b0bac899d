use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get};
use sandbox_proxy::{ContainerService, HttpContainerService, ServiceError};
use tokio::net::TcpListener;
use url::Url;

type Log = Arc<Mutex<Vec<String>>>;

async fn authorize(State(log): State<Log>, Path(email): Path<String>) -> (StatusCode, String) {
    log.lock().unwrap().push(format!("authorize {email}"));
    if email == "blocked@example.com" {
        return (StatusCode::FORBIDDEN, "no".into());
    }
    (StatusCode::OK, format!("tok-{email}\n"))
}

async fn remove(
    State(log): State<Log>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    log.lock().unwrap().push(format!("delete {email} {auth}"));
    if email == "gone@example.com" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn spawn(log: Log) -> SocketAddr {
    let app = Router::new()
        .route("/svc/authorize/{email}", get(authorize))
        .route("/svc/containers/{email}", delete(remove))
        .with_state(log);
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

fn service(addr: SocketAddr) -> HttpContainerService {
    let base = Url::parse(&format!("http://{addr}/svc/")).unwrap();
    HttpContainerService::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn authorize_then_delete_uses_issued_token() {
    let log = Log::default();
    let svc = service(spawn(log.clone()).await);

    let token = svc.authorize("dev@example.com").await.unwrap();
    assert_eq!(token, "tok-dev@example.com");
    svc.delete_container("dev@example.com", &token).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "authorize dev@example.com".to_string(),
            "delete dev@example.com tok-dev@example.com".to_string(),
        ]
    );
}

#[tokio::test]
async fn error_statuses_are_reported() {
    let svc = service(spawn(Log::default()).await);

    let err = svc.authorize("blocked@example.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status, .. } if status == StatusCode::FORBIDDEN));

    let err = svc
        .delete_container("gone@example.com", "tok")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Status { status, .. } if status == StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn unreachable_service_is_a_request_error() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = service(addr).authorize("dev@example.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::Request { .. }));
}
