//! Prompt submission and retrieval under `/chat`.

pub mod client;
pub mod handler;
pub mod session;

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

pub use client::{Completion, CompletionClient, OpenAiClient};
pub use handler::ChatHandler;
pub use session::{ChatSession, ResponseMetadata, SessionStore};

/// Runtime switches for the chat feature, changed from the admin API.
#[derive(Debug)]
pub struct ChatSettings {
    enabled: AtomicBool,
    model: RwLock<String>,
}

impl ChatSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            model: RwLock::new(model.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn model(&self) -> String {
        match self.model.read() {
            Ok(model) => model.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        match self.model.write() {
            Ok(mut current) => *current = model,
            Err(poisoned) => *poisoned.into_inner() = model,
        }
    }
}
