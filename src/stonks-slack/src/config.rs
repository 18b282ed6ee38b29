//! Configuration for the Slack side of the bot.
//!
//! Built by the server binary from its command-line flags and their
//! environment fallbacks.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SlackError, SlackResult};

/// Default Slack Web API base URL.
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Configuration for Slack integration.
#[derive(Clone)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// Signing secret for request verification. Empty disables verification.
    signing_secret: SecretString,
    /// Web API base URL.
    api_url: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SlackConfig {
    /// Create a new configuration.
    pub fn new(bot_token: impl Into<String>, signing_secret: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::new(bot_token.into().into()),
            signing_secret: SecretString::new(signing_secret.into().into()),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the client at a different Web API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the signing secret.
    pub fn signing_secret(&self) -> &str {
        self.signing_secret.expose_secret()
    }

    /// Whether inbound deliveries will be signature-checked.
    pub fn has_signing_secret(&self) -> bool {
        !self.signing_secret.expose_secret().is_empty()
    }

    /// Get the Web API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SlackResult<()> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(SlackError::Config("Bot token is empty".to_string()));
        }
        if !self.bot_token.expose_secret().starts_with("xoxb-") {
            warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(SlackError::Config(format!(
                "API URL must be http(s): {}",
                self.api_url
            )));
        }

        Ok(())
    }
}

/// Serializable configuration summary (without secrets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfigMetadata {
    /// Whether bot token is configured.
    pub has_bot_token: bool,
    /// Whether signing secret is configured.
    pub has_signing_secret: bool,
    /// Web API base URL.
    pub api_url: String,
}

impl From<&SlackConfig> for SlackConfigMetadata {
    fn from(config: &SlackConfig) -> Self {
        Self {
            has_bot_token: !config.bot_token.expose_secret().is_empty(),
            has_signing_secret: config.has_signing_secret(),
            api_url: config.api_url.clone(),
        }
    }
}
