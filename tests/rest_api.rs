//! Integration tests for the REST surface. Spins up the router on an
//! OS-assigned port with a tempdir-backed store and drives it with a real
//! HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use todod::agent::{ActionCall, Agent, Resolver};
use todod::config::ServerConfig;
use todod::rest;
use todod::storage::{Task, TaskStore};
use todod::AppContext;

/// Deterministic stand-in for the Gemini resolver: every instruction becomes
/// a listing.
struct ListResolver;

#[async_trait]
impl Resolver for ListResolver {
    async fn resolve(&self, _text: &str, _tasks: &[Task]) -> anyhow::Result<ActionCall> {
        Ok(ActionCall::List)
    }
}

async fn spawn_server(dir: &TempDir) -> String {
    let config = Arc::new(ServerConfig {
        port: 0,
        bind_address: "127.0.0.1".to_string(),
        data_dir: dir.path().to_path_buf(),
        log: "error".to_string(),
        agent_model: "gemini-2.0-flash".to_string(),
        agent_use_vertex: false,
        agent_credential: None,
    });
    let store = TaskStore::open(&config.db_path()).await.unwrap();
    let agent = Arc::new(Agent::new(store.clone(), Box::new(ListResolver)));
    let ctx = AppContext::new(config, store, agent);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = rest::build_router(ctx);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn task_body(id: i64, name: &str, description: &str, status: bool) -> Value {
    json!({ "id": id, "name": name, "description": description, "status": status })
}

#[tokio::test]
async fn test_crud_flow() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    // Empty store lists as an empty array.
    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([]));

    // Create.
    let resp = client
        .post(format!("{base}/add"))
        .json(&task_body(5, "A", "B", false))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "new task added successfully");

    // Round-trip: the row comes back exactly once, fields intact.
    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([task_body(5, "A", "B", false)]));

    // Duplicate id → 400, existing row untouched.
    let resp = client
        .post(format!("{base}/add"))
        .json(&task_body(5, "intruder", "", true))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([task_body(5, "A", "B", false)]));

    // Update overwrites all fields.
    let resp = client
        .put(format!("{base}/update/5"))
        .json(&task_body(5, "A2", "B2", true))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([task_body(5, "A2", "B2", true)]));

    // Delete, then delete again → 404.
    let resp = client.delete(format!("{base}/delete/5")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = client.delete(format!("{base}/delete/5")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([]));
}

#[tokio::test]
async fn test_path_id_wins_over_body_id() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/add"))
        .json(&task_body(1, "original", "", false))
        .send()
        .await
        .unwrap();

    // Body claims id 99; the path targets 1.
    let resp = client
        .put(format!("{base}/update/1"))
        .json(&task_body(99, "renamed", "", false))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([task_body(1, "renamed", "", false)]));
}

#[tokio::test]
async fn test_update_missing_task_is_404() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{base}/update/42"))
        .json(&task_body(42, "ghost", "", false))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_empty_name_rejected_at_boundary() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/add"))
        .json(&task_body(1, "   ", "", false))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["tasks"], json!([]));
}

#[tokio::test]
async fn test_chat_always_answers_200() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/agent/chat"))
        .json(&json!({ "message": "what's on my list?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reply"], "No tasks found. Time to get productive!");
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
