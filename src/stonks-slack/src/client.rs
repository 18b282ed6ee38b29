//! Outbound Slack Web API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::SlackConfig;
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::messages::SlackMessageContent;

/// Default timeout for Web API calls.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Seconds to wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Something that can post a message into a channel.
///
/// The event handler only depends on this trait, so tests can record
/// messages instead of talking to Slack.
#[async_trait]
pub trait MessagePoster: Send + Sync {
    /// Post `content` to `channel`, returning the new message's timestamp.
    async fn post_message(&self, channel: &str, content: SlackMessageContent)
    -> SlackResult<String>;
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    #[serde(flatten)]
    content: &'a SlackMessageContent,
}

/// Slack Web API client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    config: SlackConfig,
}

impl SlackClient {
    /// Create a client from a validated configuration.
    pub fn new(config: SlackConfig) -> SlackResult<Self> {
        Self::with_timeout(config, DEFAULT_API_TIMEOUT)
    }

    /// Create a client with a custom per-call timeout.
    pub fn with_timeout(config: SlackConfig, timeout: Duration) -> SlackResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SlackError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Send a message to a channel via `chat.postMessage`.
    pub async fn send_message(
        &self,
        channel: &str,
        content: &SlackMessageContent,
    ) -> SlackResult<String> {
        let payload = PostMessageRequest { channel, content };
        let response: serde_json::Value = self.api_call("chat.postMessage", &payload).await?;

        if response.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = response
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown");
            return Err(SlackApiError::new(error, error).into());
        }

        response
            .get("ts")
            .and_then(|ts| ts.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SlackError::Api("Missing ts in response".to_string()))
    }

    async fn api_call<P, T>(&self, method: &str, payload: &P) -> SlackResult<T>
    where
        P: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.api_url(), method);
        debug!(method, "Calling Slack API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.bot_token())
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{}: {}", status, body)));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MessagePoster for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<String> {
        self.send_message(channel, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::format_quotes_reply;

    #[test]
    fn test_client_rejects_invalid_config() {
        let result = SlackClient::new(SlackConfig::new("", "secret"));
        assert!(matches!(result, Err(SlackError::Config(_))));
    }

    #[test]
    fn test_post_message_payload_shape() {
        let content = crate::messages::format_apology()
            .in_thread("1515449483.000108")
            .broadcast();
        let payload = serde_json::to_value(PostMessageRequest {
            channel: "C0LAN2Q65",
            content: &content,
        })
        .unwrap();

        assert_eq!(payload["channel"], "C0LAN2Q65");
        assert_eq!(payload["thread_ts"], "1515449483.000108");
        assert_eq!(payload["reply_broadcast"], true);
        assert!(payload.get("blocks").is_none());
    }

    #[test]
    fn test_post_message_payload_blocks_only() {
        let content = format_quotes_reply(&[stonks_market::Quote {
            symbol: "DOCN".to_string(),
            short_name: "DigitalOcean".to_string(),
            price: 1.0,
            ..Default::default()
        }]);
        let payload = serde_json::to_value(PostMessageRequest {
            channel: "C1",
            content: &content,
        })
        .unwrap();

        assert!(payload.get("text").is_none());
        assert!(payload["blocks"].is_array());
    }
}
