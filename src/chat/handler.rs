use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::chat::ChatSettings;
use crate::chat::client::CompletionClient;
use crate::chat::session::{ChatSession, SessionStore};
use crate::http::parser::parse_form_data;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::router::Handler;

const CHAT_PREFIX: &str = "/chat";

/// Accepts prompts with `POST /chat` and serves answers from `GET /chat/{id}`.
pub struct ChatHandler {
    sessions: SessionStore,
    settings: Arc<ChatSettings>,
    client: Arc<dyn CompletionClient>,
}

impl ChatHandler {
    pub fn new(
        sessions: SessionStore,
        settings: Arc<ChatSettings>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            sessions,
            settings,
            client,
        }
    }

    async fn create(&self, request: &Request, peer: SocketAddr) -> Response {
        let prompt = match extract_prompt(request) {
            Some(prompt) => prompt,
            None => return Response::bad_request("Missing or empty prompt"),
        };

        let mut session = ChatSession::new(prompt);
        let model = self.settings.model();
        tracing::info!(peer = %peer, session = %session.id, model = %model, "Chat session created");

        match self.client.complete(&session.prompt, &model).await {
            Ok(completion) => {
                tracing::info!(
                    session = %session.id,
                    tokens = completion.metadata.total_tokens,
                    "Completion received"
                );
                session.complete(completion.content, Some(completion.metadata));
            }
            Err(e) => {
                tracing::error!(session = %session.id, error = %e, "Completion failed");
                session.complete(format!("Error: {}", e), None);
            }
        }

        let id = session.id.clone();
        self.sessions.insert(session);

        Response::created(&format!("{}/{}", CHAT_PREFIX, id), format!("id={}", id))
    }

    fn fetch(&self, id: &str) -> Response {
        let Some(session) = self.sessions.get(id) else {
            return Response::not_found(format!("Chat session not found: {}", id));
        };

        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain; charset=UTF-8");

        if let Some(meta) = &session.metadata {
            builder = builder
                .header("X-Model", meta.model.as_str())
                .header("X-Prompt-Tokens", meta.prompt_tokens.to_string())
                .header("X-Completion-Tokens", meta.completion_tokens.to_string())
                .header("X-Total-Tokens", meta.total_tokens.to_string())
                .header("X-Created", meta.created.to_string());
        }

        builder.text(session.response.unwrap_or_default()).build()
    }
}

#[async_trait]
impl Handler for ChatHandler {
    async fn handle(&self, request: &Request, peer: SocketAddr) -> anyhow::Result<Response> {
        if request.method == Method::POST && !self.settings.is_enabled() {
            return Ok(Response::service_unavailable("Chat is currently disabled"));
        }

        let rest = request.path.strip_prefix(CHAT_PREFIX).unwrap_or_default();

        let response = if rest.is_empty() {
            match request.method {
                Method::POST => self.create(request, peer).await,
                _ => Response::method_not_allowed("POST"),
            }
        } else if let Some(id) = rest.strip_prefix('/').filter(|id| !id.is_empty() && !id.contains('/')) {
            match request.method {
                Method::GET | Method::HEAD => self.fetch(id),
                _ => Response::method_not_allowed("GET, HEAD"),
            }
        } else {
            Response::not_found("Chat endpoint not found")
        };

        Ok(response)
    }
}

/// Reads the `prompt` field of a JSON or form body. When the body is of
/// another type, or has no such field, the whole body is the prompt.
fn extract_prompt(request: &Request) -> Option<String> {
    let body = request.body_str();
    let content_type = request.content_type().unwrap_or_default().to_ascii_lowercase();

    let field = if content_type.contains("application/json") {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("prompt").and_then(|p| p.as_str()).map(str::to_string))
    } else if content_type.contains("application/x-www-form-urlencoded") {
        parse_form_data(body).remove("prompt")
    } else {
        None
    };

    let prompt = field.unwrap_or_else(|| body.to_string());
    let prompt = prompt.trim();
    (!prompt.is_empty()).then(|| prompt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RequestBuilder;

    fn post(content_type: &str, body: &str) -> Request {
        RequestBuilder::new()
            .method(Method::POST)
            .path("/chat")
            .header("Content-Type", content_type)
            .body(body)
            .build()
            .unwrap()
    }

    #[test]
    fn prompt_from_json() {
        let req = post("application/json", r#"{"prompt": "say \"hi\"", "x": 1}"#);
        assert_eq!(extract_prompt(&req).as_deref(), Some("say \"hi\""));
    }

    #[test]
    fn prompt_from_form() {
        let req = post("application/x-www-form-urlencoded", "prompt=hello+there&x=1");
        assert_eq!(extract_prompt(&req).as_deref(), Some("hello there"));
    }

    #[test]
    fn prompt_from_raw_body() {
        let req = post("text/plain", "  just text \n");
        assert_eq!(extract_prompt(&req).as_deref(), Some("just text"));
    }

    #[test]
    fn missing_field_falls_back_to_body() {
        let req = post("application/json", r#"{"other": "x"}"#);
        assert_eq!(extract_prompt(&req).as_deref(), Some(r#"{"other": "x"}"#));

        let req = post("application/json", " not json ");
        assert_eq!(extract_prompt(&req).as_deref(), Some("not json"));

        let req = post("application/x-www-form-urlencoded", "text=hi");
        assert_eq!(extract_prompt(&req).as_deref(), Some("text=hi"));
    }

    #[test]
    fn empty_prompt() {
        assert!(extract_prompt(&post("application/json", r#"{"prompt": "  "}"#)).is_none());
        assert!(extract_prompt(&post("application/x-www-form-urlencoded", "prompt=")).is_none());
        assert!(extract_prompt(&post("text/plain", "   ")).is_none());
        assert!(extract_prompt(&post("text/plain", "")).is_none());
    }
}
