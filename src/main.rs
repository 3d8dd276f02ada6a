use std::sync::Arc;

use parley::app::App;
use parley::config::{Config, DEFAULT_CONFIG_PATH};
use parley::logging;
use parley::server::{ConnectionStats, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let cfg = Config::load(&config_path)?;
    let logs = logging::init(cfg.server.log_file.as_deref())?;

    tracing::info!(config = %config_path, "Configuration loaded");
    if cfg.admin.uses_default_password() {
        tracing::warn!("Admin is using the default password; set ADMIN_PASSWORD or admin.password_hash");
    }
    if cfg.openai.api_key.is_empty() {
        tracing::warn!("No OpenAI API key configured; chat requests will fail");
    }

    let stats = Arc::new(ConnectionStats::new());
    let app = App::new(&cfg, Arc::clone(&stats), logs)?;
    let server = Server::bind(&cfg.server, app.router(), stats).await?;

    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
