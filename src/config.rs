//! Server configuration.
//!
//! Loaded from a YAML file; a missing file means defaults. A few values can
//! be overridden from the environment:
//!
//! - `SERVER_HOST`, `SERVER_PORT`
//! - `OPENAI_API_KEY`
//! - `ADMIN_PASSWORD` (hashed before it is stored)

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::security::sha256_hex;

pub const DEFAULT_CONFIG_PATH: &str = "config/server.yaml";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of connections served concurrently.
    pub pool_size: usize,
    pub log_file: Option<PathBuf>,
    pub static_root: PathBuf,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    /// Hex SHA-256 of the admin password. Empty means the built-in default.
    pub password_hash: String,
    pub two_factor_enabled: bool,
    pub two_factor_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub default_model: String,
    pub api_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            pool_size: 50,
            log_file: Some(PathBuf::from("logs/server.log")),
            static_root: PathBuf::from("public"),
            shutdown_grace_secs: 30,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_hash: String::new(),
            two_factor_enabled: false,
            two_factor_code: "123456".to_string(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_model: "gpt-3.5-turbo".to_string(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AdminConfig {
    /// The configured password hash, or the hash of the default password.
    pub fn effective_password_hash(&self) -> String {
        if self.password_hash.is_empty() {
            sha256_hex(DEFAULT_ADMIN_PASSWORD)
        } else {
            self.password_hash.to_ascii_lowercase()
        }
    }

    pub fn uses_default_password(&self) -> bool {
        self.password_hash.is_empty()
    }
}

impl Config {
    /// Loads the file at `path` (defaults if it does not exist), applies
    /// environment overrides and validates the result.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let mut cfg = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Some(host) = non_empty_env("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty_env("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid SERVER_PORT: {}", port))?;
        }
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if let Some(password) = non_empty_env("ADMIN_PASSWORD") {
            self.admin.password_hash = sha256_hex(&password);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.pool_size == 0 {
            anyhow::bail!("server.pool_size must be at least 1");
        }
        if self.admin.username.is_empty() {
            anyhow::bail!("admin.username must not be empty");
        }
        url::Url::parse(&self.openai.api_url)
            .with_context(|| format!("invalid openai.api_url: {}", self.openai.api_url))?;
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
