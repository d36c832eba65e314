//! Integration tests for Jsonshop.
//!
//! Each test gets its own server on an ephemeral port, backed by real JSON
//! files in a temporary directory.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_health() {
//!     let ctx = TestContext::new().await;
//!     let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use jsonshop_server::config::StoreConfig;
use jsonshop_server::db::Database;
use jsonshop_server::routes;
use jsonshop_server::state::AppState;

/// A running server over a private data directory.
pub struct TestContext {
    pub client: Client,
    pub addr: SocketAddr,
    pub db: Database,
    data_dir: TempDir,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a server with empty collections.
    pub async fn new() -> Self {
        Self::with_files(&[]).await
    }

    /// Start a server after writing `files` (name, contents) into the data directory.
    pub async fn with_files(files: &[(&str, &str)]) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data directory");
        for (name, contents) in files {
            std::fs::write(data_dir.path().join(name), contents)
                .expect("Failed to write fixture file");
        }

        let store = StoreConfig {
            products_file: data_dir.path().join("products.json"),
            carts_file: data_dir.path().join("carts.json"),
            timeout: Duration::from_secs(5),
        };
        let db = store.open();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to ephemeral port");
        let addr = listener.local_addr().expect("Failed to read local address");
        let app = routes::app(AppState::new(db.clone()));

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            client: Client::new(),
            addr,
            db,
            data_dir,
            server,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Directory holding the collection files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// Parse a collection file straight from disk.
    #[must_use]
    pub fn read_collection(&self, name: &str) -> Value {
        let raw = std::fs::read(self.data_dir.path().join(name)).expect("Failed to read file");
        serde_json::from_slice(&raw).expect("Collection file is not JSON")
    }

    /// Create a product over HTTP and return its JSON.
    pub async fn create_product(&self, body: &Value) -> Value {
        let resp = self
            .client
            .post(self.url("/products"))
            .json(body)
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), 201, "create_product failed");
        resp.json().await.expect("Invalid product JSON")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}
