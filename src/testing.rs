//! In-process fakes for the task gateway and the model provider.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::auth::{Clock, CredentialManager};
use crate::config::GatewayConfig;
use crate::gateway::GatewayClient;

/// A request the mock server received, other than a login.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(String, String), (u16, Value)>>,
    delays: Mutex<HashMap<(String, String), std::time::Duration>>,
    requests: Mutex<Vec<Recorded>>,
    login_bodies: Mutex<Vec<Value>>,
    logins: AtomicUsize,
    login_status: Mutex<Option<u16>>,
}

/// HTTP server on an ephemeral port that answers canned JSON per (method, path).
///
/// `POST /api/auth/login` is built in and hands out `token-1`, `token-2`, ...
/// Unrouted requests get a 404.
pub struct MockServer {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    /// Hold the response for `method path` back by `by`.
    pub fn delay(&self, method: &str, path: &str, by: std::time::Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), by);
    }

    pub fn reject_logins(&self, status: u16) {
        *self.state.login_status.lock().unwrap() = Some(status);
    }

    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn last_login(&self) -> Option<Value> {
        self.state.login_bodies.lock().unwrap().last().cloned()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body: Option<Value> = serde_json::from_slice(&body).ok();

    if method == Method::POST && path == "/api/auth/login" {
        if let Some(status) = *state.login_status.lock().unwrap() {
            let status = StatusCode::from_u16(status).unwrap();
            return (status, Json(json!({ "error": "Invalid credentials" }))).into_response();
        }
        let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
        state
            .login_bodies
            .lock()
            .unwrap()
            .push(body.unwrap_or(Value::Null));
        return Json(json!({ "token": format!("token-{}", n), "user": { "role": "admin" } }))
            .into_response();
    }

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        body,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let key = (method.to_string(), path);
    let delay = state.delays.lock().unwrap().get(&key).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let route = state.routes.lock().unwrap().get(&key).cloned();

    match route {
        Some((status, body)) => {
            (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "no route" }))).into_response(),
    }
}

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Gateway client pointed at `server`, with a frozen clock for its credentials.
pub fn gateway_for(server: &MockServer) -> GatewayClient {
    gateway_with_client(server, reqwest::Client::new())
}

pub fn gateway_with_client(server: &MockServer, client: reqwest::Client) -> GatewayClient {
    let config = GatewayConfig {
        base_url: server.base_url.clone(),
        ..GatewayConfig::default()
    };
    let credentials = Arc::new(CredentialManager::with_clock(
        &config,
        client.clone(),
        Arc::new(ManualClock::new()),
    ));
    GatewayClient::new(&config.base_url, client, credentials)
}

pub fn project_json(id: &str, name: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "description": "d",
        "userId": "u",
        "isActive": true,
        "createdAt": "t",
        "updatedAt": "t"
    })
}

pub fn task_json(id: &str, project_id: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "name": "Task",
        "description": "d",
        "projectId": project_id,
        "status": status,
        "completedBy": [],
        "createdAt": "t",
        "updatedAt": "t"
    })
}

pub fn note_json(id: &str, task_id: &str, content: &str) -> Value {
    json!({
        "_id": id,
        "content": content,
        "createdBy": "u",
        "taskId": task_id,
        "createdAt": "t",
        "updatedAt": "t"
    })
}
