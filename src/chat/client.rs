//! Completion backends.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::session::ResponseMetadata;
use crate::config::OpenAiConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Text produced for a prompt, with usage details.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub metadata: ResponseMetadata,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str) -> anyhow::Result<Completion>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    id: Option<String>,
    model: Option<String>,
    created: Option<u64>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiClient {
    pub fn new(cfg: &OpenAiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            api_url: cfg.api_url.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str, model: &str) -> anyhow::Result<Completion> {
        if self.api_key.is_empty() {
            anyhow::bail!("OpenAI API key not configured");
        }

        let body = CompletionRequest {
            model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timeout")
                } else {
                    anyhow::anyhow!(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), detail = %detail, "Completion API error");
            anyhow::bail!("API returned status {}", status.as_u16());
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Could not parse response")?;

        into_completion(parsed)
    }
}

fn into_completion(parsed: CompletionResponse) -> anyhow::Result<Completion> {
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("Could not parse response")?;

    let usage = parsed.usage.unwrap_or_default();
    let created = parsed.created.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    });

    Ok(Completion {
        content,
        metadata: ResponseMetadata {
            model: parsed.model.unwrap_or_default(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            created,
            response_id: parsed.id,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_content_and_usage() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello \"there\"\n{}"}}],
            "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
        }"#;

        let completion = into_completion(serde_json::from_str(raw).unwrap()).unwrap();

        assert_eq!(completion.content, "Hello \"there\"\n{}");
        assert_eq!(completion.metadata.model, "gpt-3.5-turbo-0125");
        assert_eq!(completion.metadata.total_tokens, 21);
        assert_eq!(completion.metadata.created, 1_700_000_000);
        assert_eq!(completion.metadata.response_id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn missing_choices_is_an_error() {
        let parsed = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(into_completion(parsed).is_err());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OpenAiClient::new(&OpenAiConfig::default()).unwrap();
        let err = client.complete("hi", "gpt-3.5-turbo").await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API key not configured");
    }
}
