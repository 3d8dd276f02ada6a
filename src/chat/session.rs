//! Chat sessions and their in-memory store.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;

/// Sessions kept before expired ones are purged.
pub const MAX_SESSIONS: usize = 10_000;

/// Age after which a session may be purged.
pub const SESSION_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

const PREVIEW_CHARS: usize = 50;

/// Model and token usage reported with a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// Unix timestamp (seconds) when the completion was created.
    pub created: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    pub prompt: String,
    pub response: Option<String>,
    pub metadata: Option<ResponseMetadata>,
    /// Unix timestamp (milliseconds) of creation.
    pub created_at: u64,
}

/// Row in the admin sessions listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub prompt_preview: String,
    pub model: String,
    pub total_tokens: u32,
    pub timestamp: u64,
}

impl ChatSession {
    /// Starts a session with a fresh 16-character id.
    pub fn new(prompt: impl Into<String>) -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(16);

        Self {
            id,
            prompt: prompt.into(),
            response: None,
            metadata: None,
            created_at: now_millis(),
        }
    }

    pub fn complete(&mut self, response: impl Into<String>, metadata: Option<ResponseMetadata>) {
        self.response = Some(response.into());
        self.metadata = metadata;
    }

    /// The prompt cut to 50 characters, ellipsized when longer.
    pub fn prompt_preview(&self) -> String {
        if self.prompt.chars().count() <= PREVIEW_CHARS {
            return self.prompt.clone();
        }
        let mut preview: String = self.prompt.chars().take(PREVIEW_CHARS - 3).collect();
        preview.push_str("...");
        preview
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            prompt_preview: self.prompt_preview(),
            model: self.metadata.as_ref().map(|m| m.model.clone()).unwrap_or_default(),
            total_tokens: self.metadata.as_ref().map(|m| m.total_tokens).unwrap_or(0),
            timestamp: self.created_at,
        }
    }

    fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) > SESSION_EXPIRY.as_millis() as u64
    }
}

/// Thread-safe session storage shared by the chat and admin handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, ChatSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session, purging expired ones first when the store is full.
    pub fn insert(&self, session: ChatSession) {
        if self.sessions.len() >= MAX_SESSIONS {
            self.purge_expired();
        }
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn get(&self, id: &str) -> Option<ChatSession> {
        self.sessions.get(id).map(|s| s.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Up to `limit` sessions, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ChatSession> {
        let mut all: Vec<ChatSession> = self.sessions.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        all
    }

    pub fn purge_expired(&self) {
        let now = now_millis();
        self.sessions.retain(|_, s| !s.is_expired(now));
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
