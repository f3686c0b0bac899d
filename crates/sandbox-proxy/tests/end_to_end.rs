use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use sandbox_client::{ClientConfig, Provisioner, ProvisioningUi, ResetOutcome};
use sandbox_protocol::SessionState;
use sandbox_proxy::{
    HttpContainerService, MemProfileStore, ProfileStore, ProxyConfig, ProxyState, SystemClock,
    serve,
};
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone, Default)]
struct Backend {
    log: Arc<Mutex<Vec<String>>>,
    polls: Arc<AtomicUsize>,
}

impl Backend {
    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

async fn authorize(State(b): State<Backend>, Path(email): Path<String>) -> String {
    b.push(format!("authorize {email}"));
    format!("tok-{email}")
}

async fn create(State(b): State<Backend>, Path(email): Path<String>) -> impl IntoResponse {
    b.push(format!("create {email}"));
    (StatusCode::ACCEPTED, [(LOCATION, "/svc/status/job-7")])
}

async fn status(State(b): State<Backend>) -> Json<serde_json::Value> {
    if b.polls.fetch_add(1, Ordering::SeqCst) == 0 {
        return Json(json!({ "state": "Building" }));
    }
    Json(json!({
        "state": "Success",
        "data": {
            "ide_url": "https://sbx.example/ide",
            "username": "tech",
            "password": "demo",
            "smp_url": "https://sbx.example/csp/sys/UtilHome.csp",
            "ext_ide_ip": "203.0.113.4",
            "ext_ide_port": "8443",
            "isc_ip": "203.0.113.5",
            "isc_port": "51773",
            "web_ide_port": "52773",
            "expires": "2099-01-01T00:00:00Z"
        }
    }))
}

async fn remove(State(b): State<Backend>, Path(email): Path<String>) -> StatusCode {
    b.push(format!("delete {email}"));
    StatusCode::NO_CONTENT
}

async fn spawn_backend(backend: Backend) -> SocketAddr {
    let app = Router::new()
        .route("/svc/authorize/{email}", get(authorize))
        .route("/svc/containers/{email}", post(create).delete(remove))
        .route("/svc/status/{job}", get(status))
        .with_state(backend);
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

#[derive(Default)]
struct CountingUi {
    reloads: AtomicUsize,
    errors: AtomicUsize,
}

impl ProvisioningUi for CountingUi {
    fn show_waiting(&self) {}

    fn show_error(&self, _status_text: &str, _error_text: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[tokio::test]
async fn launch_persist_status_and_reset_round_trip() {
    let backend = Backend::default();
    let backend_addr = spawn_backend(backend.clone()).await;

    let base = Url::parse(&format!("http://{backend_addr}/svc/")).unwrap();
    let config = ProxyConfig::new(base.clone());
    let store = Arc::new(MemProfileStore::new());
    let user = store.put_user("dev@example.com").unwrap();
    store.put_session("s1", user.id).unwrap();
    let service = HttpContainerService::new(base, Duration::from_secs(5)).unwrap();
    let state = ProxyState::new(config, store.clone(), Arc::new(service), Arc::new(SystemClock));

    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let proxy_addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(serve(listener, state, std::future::pending()));

    let ajax = Url::parse(&format!("http://{proxy_addr}/wp-admin/admin-ajax.php")).unwrap();
    let config = ClientConfig::new(ajax)
        .with_cookie("sandbox_session=s1")
        .with_poll_interval(Duration::from_millis(20));
    let mut client = Provisioner::new(config, CountingUi::default()).unwrap();

    let info = client.proxy().launch_info().await.expect("launch info");
    assert_eq!(info.token, "tok-dev@example.com");
    client
        .launch(&info.provisioning_url, &info.token)
        .await
        .expect("provisioning succeeds");
    assert_eq!(client.session().state, SessionState::Succeeded);
    assert_eq!(client.ui().reloads.load(Ordering::SeqCst), 1);
    assert_eq!(backend.polls.load(Ordering::SeqCst), 2);

    let current = client.proxy().status().await.unwrap();
    let record = current.sandbox.expect("record visible after save");
    assert_eq!(record.connection.isc_port, "51773");
    assert!(record.expires.timestamp() < 4_000_000_000);

    assert_eq!(client.reset().await, ResetOutcome::Reset);
    assert!(client.proxy().status().await.unwrap().sandbox.is_none());
    assert_eq!(client.ui().errors.load(Ordering::SeqCst), 0);

    assert_eq!(
        *backend.log.lock().unwrap(),
        vec![
            "authorize dev@example.com".to_string(),
            "create dev@example.com".to_string(),
            "authorize dev@example.com".to_string(),
            "delete dev@example.com".to_string(),
        ]
    );

    server.abort();
    let _ = server.await;
}
