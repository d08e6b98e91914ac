use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use ideameet_core::config::{LlmConfig, LlmProvider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub const SYSTEM_PROMPT: &str = "당신은 팀의 아이디어 회의를 돕는 어시스턴트입니다. \
     항상 한국어로, Slack 메시지에 어울리는 간결한 문장으로 답변하세요.";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("llm request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llm provider `{provider}` returned HTTP {status}: {body}")]
    Status { provider: &'static str, status: u16, body: String },
    #[error("llm provider `{0}` returned no text")]
    EmptyCompletion(&'static str),
    #[error("llm provider `{0}` requires an api key")]
    MissingApiKey(&'static str),
}

/// Completion client for the configured provider. Ollama is reached through
/// its OpenAI-compatible `/v1` API.
pub struct HttpLlmClient {
    client: Client,
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        let root = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| default_root(config.provider));

        let this = Self {
            client,
            provider: config.provider,
            endpoint: format!("{}/v1", root.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        };

        if this.provider != LlmProvider::Ollama && this.api_key.is_none() {
            return Err(GenerationError::MissingApiKey(provider_name(this.provider)));
        }
        Ok(this)
    }

    async fn chat_completion(&self, prompt: &str) -> Result<String, GenerationError> {
        let name = provider_name(self.provider);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
        };

        let mut builder = self.client.post(format!("{}/chat/completions", self.endpoint));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { provider: name, status: status.as_u16(), body });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyCompletion(name))
    }

    async fn anthropic_message(&self, prompt: &str) -> Result<String, GenerationError> {
        let name = provider_name(self.provider);
        let api_key = self.api_key.as_ref().ok_or(GenerationError::MissingApiKey(name))?;
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { provider: name, status: status.as_u16(), body });
        }

        let body: AnthropicResponse = response.json().await?;
        let text = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyCompletion(name));
        }
        Ok(text.to_owned())
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let provider = provider_name(self.provider);
        debug!(provider, model = %self.model, "requesting completion");

        let outcome = match self.provider {
            LlmProvider::Anthropic => self.anthropic_message(prompt).await,
            LlmProvider::OpenAi | LlmProvider::Ollama => self.chat_completion(prompt).await,
        };

        outcome.map_err(|failure| {
            error!(
                event_name = "agent.llm.request_failed",
                provider,
                model = %self.model,
                is_timeout = matches!(&failure, GenerationError::Http(e) if e.is_timeout()),
                error = %failure,
                "llm request failed"
            );
            failure.into()
        })
    }
}

fn default_root(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "https://api.openai.com",
        LlmProvider::Anthropic => "https://api.anthropic.com",
        LlmProvider::Ollama => "http://localhost:11434",
    }
}

fn provider_name(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "openai",
        LlmProvider::Anthropic => "anthropic",
        LlmProvider::Ollama => "ollama",
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use ideameet_core::config::{LlmConfig, LlmProvider};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{GenerationError, HttpLlmClient, LlmClient};

    fn config(provider: LlmProvider, base_url: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: api_key.map(|key| key.to_owned().into()),
            base_url: Some(base_url.to_owned()),
            model: "test-model".to_owned(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn openai_uses_chat_completions_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "  요약입니다 \n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpLlmClient::from_config(&config(LlmProvider::OpenAi, &server.uri(), Some("sk-test")))
                .expect("client");
        assert_eq!(client.complete("대화").await.expect("completion"), "요약입니다");
    }

    #[tokio::test]
    async fn ollama_needs_no_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "피자 자전거" } }]
            })))
            .mount(&server)
            .await;

        let client = HttpLlmClient::from_config(&config(LlmProvider::Ollama, &server.uri(), None))
            .expect("client");
        assert_eq!(client.complete("단어").await.expect("completion"), "피자 자전거");
    }

    #[tokio::test]
    async fn anthropic_joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    { "type": "text", "text": "첫 문장. " },
                    { "type": "text", "text": "둘째 문장." }
                ]
            })))
            .mount(&server)
            .await;

        let client = HttpLlmClient::from_config(&config(
            LlmProvider::Anthropic,
            &server.uri(),
            Some("sk-ant-test"),
        ))
        .expect("client");
        assert_eq!(client.complete("p").await.expect("completion"), "첫 문장. 둘째 문장.");
    }

    #[tokio::test]
    async fn error_status_and_empty_output_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = HttpLlmClient::from_config(&config(LlmProvider::Ollama, &server.uri(), None))
            .expect("client");

        let first = client.complete("p").await.expect_err("503");
        assert!(matches!(
            first.downcast_ref::<GenerationError>(),
            Some(GenerationError::Status { status: 503, .. })
        ));
        assert!(first.to_string().contains("overloaded"));

        let second = client.complete("p").await.expect_err("empty");
        assert!(matches!(
            second.downcast_ref::<GenerationError>(),
            Some(GenerationError::EmptyCompletion("ollama"))
        ));
    }

    #[test]
    fn hosted_providers_require_an_api_key() {
        let result = HttpLlmClient::from_config(&config(LlmProvider::OpenAi, "http://x", None));
        assert!(matches!(result, Err(GenerationError::MissingApiKey("openai"))));
    }
}
