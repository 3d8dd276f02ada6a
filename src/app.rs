//! Wires configuration, shared state and handlers into a router.

use std::sync::Arc;

use crate::admin::{AdminHandler, AuthManager};
use crate::chat::{ChatHandler, ChatSettings, CompletionClient, OpenAiClient, SessionStore};
use crate::config::Config;
use crate::http::router::Router;
use crate::http::static_files::StaticFiles;
use crate::logging::RecentLogs;
use crate::server::ConnectionStats;

/// Services shared by every connection.
pub struct App {
    pub stats: Arc<ConnectionStats>,
    pub sessions: SessionStore,
    pub settings: Arc<ChatSettings>,
    pub auth: Arc<AuthManager>,
    pub logs: RecentLogs,
    static_files: StaticFiles,
    client: Arc<dyn CompletionClient>,
}

impl App {
    /// Builds the application with the OpenAI completion client.
    pub fn new(cfg: &Config, stats: Arc<ConnectionStats>, logs: RecentLogs) -> anyhow::Result<Self> {
        let client = Arc::new(OpenAiClient::new(&cfg.openai)?);
        Ok(Self::with_client(cfg, stats, logs, client))
    }

    pub fn with_client(
        cfg: &Config,
        stats: Arc<ConnectionStats>,
        logs: RecentLogs,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            stats,
            sessions: SessionStore::new(),
            settings: Arc::new(ChatSettings::new(cfg.openai.default_model.clone())),
            auth: Arc::new(AuthManager::new(&cfg.admin)),
            logs,
            static_files: StaticFiles::new(cfg.server.static_root.clone()),
            client,
        }
    }

    /// `/chat` and `/admin` handlers in front of the static file root.
    pub fn router(&self) -> Arc<Router> {
        let chat = ChatHandler::new(
            self.sessions.clone(),
            Arc::clone(&self.settings),
            Arc::clone(&self.client),
        );
        let admin = AdminHandler::new(
            Arc::clone(&self.auth),
            Arc::clone(&self.stats),
            self.sessions.clone(),
            Arc::clone(&self.settings),
            self.logs.clone(),
            self.static_files.clone(),
        );

        Arc::new(
            Router::new(self.static_files.clone())
                .mount("/chat", Arc::new(chat))
                .mount("/admin", Arc::new(admin)),
        )
    }
}
