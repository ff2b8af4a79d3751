//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use openshift_client::{
    Api, HttpMethod, RequestExecutor, Transport, TransportError, TransportRequest,
    TransportResponse,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

pub const BASE: &str = "https://openshift.example.com/broker/rest";

/// Load `tests/samples/<name>` with every `{{BASE}}` replaced by `base`
pub fn sample(name: &str, base: &str) -> String {
    let path = format!("{}/tests/samples/{}", env!("CARGO_MANIFEST_DIR"), name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("sample {} unreadable: {}", path, e));
    text.replace("{{BASE}}", base)
}

type RouteKey = (HttpMethod, String);

/// In-memory transport answering from a script and recording every request.
///
/// Routes are keyed by method and URL path. Queued responses are served in
/// order; the last one keeps answering once the queue is drained. Unknown
/// routes answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<TransportResponse>>>,
    calls: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `method path` (relative to the service root) with `body`
    pub fn on(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        let key = (method, full_path(path));
        self.routes
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(TransportResponse::new(status, body));
    }

    /// Answer with a file from `tests/samples`
    pub fn on_sample(&self, method: HttpMethod, path: &str, status: u16, name: &str) {
        self.on(method, path, status, &sample(name, BASE));
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, method: HttpMethod, path: &str) -> usize {
        let path = full_path(path);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .count()
    }

    pub fn last_call(&self) -> Option<TransportRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

fn full_path(path: &str) -> String {
    let root = Url::parse(BASE).unwrap();
    format!(
        "{}/{}",
        root.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let key = (request.method, request.url.path().to_string());
        self.calls.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| {
            TransportResponse::new(
                404,
                r#"{"type":null,"status":"not_found","data":null,"messages":[{"text":"no route","exit_code":0}]}"#,
            )
        }))
    }
}

/// Transport that always fails before any status arrives
pub struct FailingTransport(pub TransportError);

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, TransportError> {
        Err(self.0.clone())
    }
}

/// Script the usual broker: API root, user, two domains and two keys
pub fn broker() -> Arc<ScriptedTransport> {
    let transport = ScriptedTransport::new();
    transport.on_sample(HttpMethod::Get, "/api", 200, "get-rest-api.json");
    transport.on_sample(HttpMethod::Get, "/user", 200, "get-user.json");
    transport.on_sample(HttpMethod::Get, "/domains", 200, "get-domains.json");
    transport.on_sample(HttpMethod::Get, "/user/keys", 200, "get-user-keys-multiple.json");
    transport
}

pub fn api_on(transport: Arc<ScriptedTransport>) -> Api {
    let executor = RequestExecutor::new(Url::parse(BASE).unwrap(), transport);
    Api::new(executor)
}
