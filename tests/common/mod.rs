#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley::app::App;
use parley::chat::{Completion, CompletionClient, ResponseMetadata};
use parley::config::Config;
use parley::http::request::{Method, Request, RequestBuilder};
use parley::logging::RecentLogs;
use parley::server::ConnectionStats;

/// Answers every prompt with `echo: <prompt>` after an optional delay.
pub struct EchoClient {
    pub delay: Duration,
}

#[async_trait]
impl CompletionClient for EchoClient {
    async fn complete(&self, prompt: &str, model: &str) -> anyhow::Result<Completion> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Completion {
            content: format!("echo: {}", prompt),
            metadata: ResponseMetadata {
                model: model.to_string(),
                prompt_tokens: 3,
                completion_tokens: 5,
                total_tokens: 8,
                created: 1_700_000_000,
                response_id: Some("resp-1".to_string()),
            },
        })
    }
}

/// Always fails, as an unreachable backend would.
pub struct FailingClient;

#[async_trait]
impl CompletionClient for FailingClient {
    async fn complete(&self, _prompt: &str, _model: &str) -> anyhow::Result<Completion> {
        anyhow::bail!("API returned status 429")
    }
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

pub fn test_config(static_root: &std::path::Path) -> Config {
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.server.pool_size = 8;
    cfg.server.log_file = None;
    cfg.server.static_root = static_root.to_path_buf();
    cfg.server.shutdown_grace_secs = 2;
    cfg
}

pub fn app_with(cfg: &Config, client: Arc<dyn CompletionClient>) -> App {
    App::with_client(cfg, Arc::new(ConnectionStats::new()), RecentLogs::new(), client)
}

pub fn echo_app(cfg: &Config) -> App {
    app_with(cfg, Arc::new(EchoClient { delay: Duration::ZERO }))
}

pub fn get(path: &str) -> Request {
    RequestBuilder::new().method(Method::GET).path(path).build().unwrap()
}

pub fn request(method: Method, path: &str) -> RequestBuilder {
    RequestBuilder::new().method(method).path(path)
}

pub fn text(response: &parley::http::response::Response) -> String {
    String::from_utf8(response.body().to_bytes().to_vec()).unwrap()
}
