//! Slack Events API intake for the stonks bot.
//!
//! This crate provides:
//! - Request signature verification for inbound deliveries
//! - Events API envelope parsing (URL verification and event callbacks)
//! - Market symbol extraction from mention text
//! - Block Kit quote replies
//! - The `/slack/event` endpoint tying it all together
//! - A Web API client for posting replies
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stonks_market::YahooBackend;
//! use stonks_slack::{EventHandler, SlackClient, SlackConfig, routes};
//!
//! let config = SlackConfig::new(bot_token, signing_secret);
//! let client = SlackClient::new(config.clone())?;
//! let handler = EventHandler::new(
//!     config.signing_secret(),
//!     Arc::new(YahooBackend::new()?),
//!     Arc::new(client),
//! );
//! let app = routes(Arc::new(handler));
//! ```
//!
//! # Configuration
//!
//! [`SlackConfig`] carries:
//! - the bot OAuth token (xoxb-...)
//! - the signing secret for request verification (empty disables it)
//! - the Web API base URL

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod messages;
pub mod signature;
pub mod symbols;

// Re-export main types
pub use client::{MessagePoster, SlackClient};
pub use config::{SlackConfig, SlackConfigMetadata};
pub use error::{SlackApiError, SlackError, SlackResult};
pub use events::{EventEnvelope, InnerEvent, ParseError, parse_envelope};
pub use handler::{DispatchError, EventHandler, HandlerOptions, routes};
pub use messages::{SlackMessageBuilder, SlackMessageContent, format_quotes_reply};
pub use signature::{AuthError, SignatureVerifier, Verification};
pub use symbols::{extract_symbols, symbols_in_text};
