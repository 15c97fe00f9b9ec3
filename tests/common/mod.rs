#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use shopfront_api::auth::{Role, TokenService, UserClaims};
use shopfront_api::database::MemoryStore;
use shopfront_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// An in-process server backed by a fresh `MemoryStore`
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let tokens = TokenService::with_secret(TEST_SECRET)?;
        let state = AppState::new(Arc::new(MemoryStore::new()), tokens);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            state,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Absolute URL for a path under `/api/v1`
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Register a customer over HTTP and return their token
    pub async fn customer_token(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.api("/auth/customer/register"))
            .json(&json!({ "name": "Casey Customer", "email": email, "password": "hunter22" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "customer register returned {}", res.status());
        token_from(res).await
    }

    /// Register a staff member over HTTP and return their token
    pub async fn staff_token(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.api("/auth/staff/register"))
            .json(&json!({ "name": "Sam Staff", "email": email, "password": "hunter22" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "staff register returned {}", res.status());
        token_from(res).await
    }

    /// Admins cannot register over HTTP, so sign one directly
    pub fn admin_token(&self) -> Result<String> {
        let claims = UserClaims {
            cust_id: None,
            staff_id: Some(9000),
            name: "Ada Admin".to_string(),
            email: "ada@example.com".to_string(),
            role: Some(Role::Admin),
        };
        Ok(self.state.tokens.issue(&claims)?)
    }

    /// Create a record as `token` and return its id
    pub async fn create(&self, token: &str, path: &str, body: Value, id_key: &str) -> Result<i64> {
        let res = self
            .client
            .post(self.api(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        let body: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} returned {}: {}", path, status, body);
        body["data"][id_key].as_i64().context("created record has no id")
    }
}

pub async fn token_from(res: reqwest::Response) -> Result<String> {
    let body: Value = res.json().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("response has no token")
}

pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
