//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use swcache_core::http::{FetchRequest, ResponseType, WorkerResponse};
use swcache_core::{AppConfig, CacheDb, Error, Network, ServiceWorker, WorkerScript};

pub const ORIGIN: &str = "https://app.example.com";

/// Answers routed URLs with a 200 basic response; everything else fails at
/// the network layer.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, &'static str>>,
}

impl StubNetwork {
    pub fn serve(&self, url: &str, body: &'static str) {
        self.routes.lock().unwrap().insert(url.to_string(), body);
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, Error> {
        let body = self.routes.lock().unwrap().get(&request.url).copied();
        let body = body.ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))?;
        Ok(WorkerResponse {
            url: request.url.clone(),
            status: 200,
            status_text: "OK".into(),
            response_type: ResponseType::Basic,
            headers: vec![("content-type".into(), "text/html".into())],
            body: Bytes::from_static(body.as_bytes()),
        })
    }
}

pub fn config() -> AppConfig {
    AppConfig {
        app_name: "notes".into(),
        cache_version: "v2".into(),
        date_suffix: Some(false),
        origin: ORIGIN.into(),
        manifest: vec!["/".into(), "/index.html".into()],
        ..Default::default()
    }
}

/// A worker with nothing installed yet and the manifest reachable.
pub async fn fresh_worker() -> ServiceWorker<StubNetwork> {
    let network = StubNetwork::default();
    network.serve("https://app.example.com/", "root");
    network.serve("https://app.example.com/index.html", "<html>notes</html>");
    let db = CacheDb::open_in_memory().await.unwrap();
    ServiceWorker::new(db, Arc::new(network), ORIGIN)
}

/// A worker with `notes-v2` installed and active.
pub async fn active_worker() -> ServiceWorker<StubNetwork> {
    let worker = fresh_worker().await;
    let script = WorkerScript::current(Arc::new(config())).unwrap();
    worker.install(Arc::new(script)).await.unwrap();
    worker
}

/// Parse the JSON text content of a tool result.
pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(|v| v.as_str()).expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
