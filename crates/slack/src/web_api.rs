use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slack api `{method}` returned HTTP {status}")]
    Status { method: &'static str, status: u16 },
    #[error("slack api `{method}` rate limited; retry after {retry_after_secs}s")]
    RateLimited { method: &'static str, retry_after_secs: u64 },
    #[error("slack api `{method}` failed: {error}")]
    Api { method: &'static str, error: String },
}

/// The slice of the Slack Web API the bot relies on.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `users.info`: the profile email of a user, if Slack exposes one.
    async fn user_email(&self, user_id: &str) -> Result<Option<String>, SlackApiError>;

    /// `conversations.history`: up to `limit` recent message texts, oldest first.
    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<String>, SlackApiError>;

    /// `chat.postMessage`: one plain-text message to a channel.
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError>;
}

pub struct SlackWebClient {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(client: Client, base_url: impl Into<String>, bot_token: SecretString) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_owned(), bot_token }
    }

    pub fn build(
        base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, base_url, bot_token))
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<T>(
        &self,
        method: &'static str,
        request: RequestBuilder,
    ) -> Result<T, SlackApiError>
    where
        T: DeserializeOwned + SlackEnvelope,
    {
        let response = request.bearer_auth(self.bot_token.expose_secret()).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(30);
            return Err(SlackApiError::RateLimited { method, retry_after_secs });
        }

        if !response.status().is_success() {
            return Err(SlackApiError::Status { method, status: response.status().as_u16() });
        }

        let body: T = response.json().await?;
        if !body.ok() {
            let error = body.error().unwrap_or("unknown_error").to_owned();
            return Err(SlackApiError::Api { method, error });
        }

        debug!(method, "slack api call succeeded");
        Ok(body)
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn user_email(&self, user_id: &str) -> Result<Option<String>, SlackApiError> {
        let request = self.client.get(self.url("users.info")).query(&[("user", user_id)]);
        let response: UsersInfoResponse = self.call("users.info", request).await?;

        Ok(response
            .user
            .and_then(|user| user.profile)
            .and_then(|profile| profile.email)
            .filter(|email| !email.trim().is_empty()))
    }

    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<String>, SlackApiError> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(self.url("conversations.history"))
            .query(&[("channel", channel_id), ("limit", limit.as_str())]);
        let response: HistoryResponse = self.call("conversations.history", request).await?;

        // Slack returns newest first.
        Ok(response
            .messages
            .into_iter()
            .rev()
            .map(|message| message.text)
            .filter(|text| !text.trim().is_empty())
            .collect())
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError> {
        let request = self
            .client
            .post(self.url("chat.postMessage"))
            .json(&serde_json::json!({ "channel": channel_id, "text": text }));
        let _: PostMessageResponse = self.call("chat.postMessage", request).await?;
        Ok(())
    }
}

trait SlackEnvelope {
    fn ok(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

macro_rules! slack_envelope {
    ($name:ty) => {
        impl SlackEnvelope for $name {
            fn ok(&self) -> bool {
                self.ok
            }

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }
        }
    };
}

#[derive(Debug, Deserialize)]
struct UsersInfoResponse {
    ok: bool,
    error: Option<String>,
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    profile: Option<SlackProfile>,
}

#[derive(Debug, Deserialize)]
struct SlackProfile {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
struct HistoryMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

slack_envelope!(UsersInfoResponse);
slack_envelope!(HistoryResponse);
slack_envelope!(PostMessageResponse);
