//! Integration tests for DocGate server.
//!
//! These tests require a running DocGate server at `localhost:8080` backed by
//! a reachable CouchDB. They are marked `#[ignore]` so they don't run during
//! normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p docgate-integration -- --ignored
//! ```

use std::sync::Once;

use serde_json::Value;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the gateway.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("DOCGATE_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Create an HTTP client for the gateway.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Build a gateway URL from a path starting with `/`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", endpoint_url())
}

/// Generate a unique database name for a test.
///
/// CouchDB names must start with a lowercase letter.
#[must_use]
pub fn test_database_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a database and return its name.
pub async fn create_test_database(client: &reqwest::Client, prefix: &str) -> String {
    let db = test_database_name(prefix);
    let resp = client
        .put(url(&format!("/{db}")))
        .send()
        .await
        .expect("create database request should succeed");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    db
}

/// Delete a database, ignoring errors.
pub async fn cleanup_database(client: &reqwest::Client, db: &str) {
    let _ = client.delete(url(&format!("/{db}"))).send().await;
}

/// Read a response body as JSON.
pub async fn json_body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("response body should be JSON")
}

mod test_database;
mod test_document;
mod test_error;
