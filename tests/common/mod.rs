//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use backend_api::config::AppConfig;
use backend_api::http::HttpServer;
use backend_api::store;

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Baseline test configuration: in-memory database, local hosts allowed,
/// rate limiting off so unrelated suites never trip it.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    // Each in-memory SQLite connection is its own database, so the pool is
    // pinned to one connection.
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.security.allowed_hosts = vec!["127.0.0.1".to_string(), "localhost".to_string()];
    config.rate_limit.enabled = false;
    config
}

/// Boot the real server on an ephemeral port and return a client for it.
pub async fn spawn_app(config: AppConfig) -> TestApp {
    let pool = store::connect(&config.database).await.expect("pool");
    store::init_schema(&pool).await.expect("schema");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let server = HttpServer::new(config, pool);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("client");

    TestApp { addr, client }
}
