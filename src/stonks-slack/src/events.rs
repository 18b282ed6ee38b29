//! Events API envelope parsing.
//!
//! Every delivery to the events endpoint is one of:
//! - `url_verification` - the handshake Slack sends when the request URL is
//!   configured; answered by echoing the challenge
//! - `event_callback` - a wrapped workspace event, of which only
//!   `app_mention` is acted on
//!
//! Anything else is reported as an unrecognized envelope. The legacy
//! verification `token` field is ignored; request signatures are the only
//! trust mechanism.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Envelope type for the URL verification handshake.
pub const URL_VERIFICATION: &str = "url_verification";

/// Envelope type for wrapped workspace events.
pub const EVENT_CALLBACK: &str = "event_callback";

/// Inner event type for bot mentions.
pub const APP_MENTION: &str = "app_mention";

/// Errors produced while decoding a delivery body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Body is not a well-formed envelope.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Envelope decoded but its `type` is not one we know.
    #[error("unrecognized envelope type: {0}")]
    UnrecognizedEnvelope(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

/// Top-level delivery shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EventEnvelope {
    /// Handshake that must be answered with the challenge.
    UrlVerification(UrlVerification),
    /// A workspace event.
    EventCallback(EventCallback),
}

/// URL verification handshake payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlVerification {
    /// Value to echo back.
    pub challenge: String,
}

/// Response body for the URL verification handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// Echoed challenge value.
    #[serde(rename = "Challenge")]
    pub challenge: String,
}

/// Event callback wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCallback {
    /// Team ID.
    pub team_id: Option<String>,
    /// API app ID.
    pub api_app_id: Option<String>,
    /// Event ID, unique per delivery.
    pub event_id: Option<String>,
    /// Event time (Unix seconds).
    pub event_time: Option<i64>,
    /// The wrapped event.
    pub event: InnerEvent,
}

/// Workspace event carried by a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum InnerEvent {
    /// The bot was @mentioned.
    AppMention(AppMentionEvent),
    /// Any other event type. Decoded, but not acted on.
    Other {
        /// The event's `type` field.
        event_type: String,
    },
}

impl InnerEvent {
    /// The event's `type` discriminant.
    pub fn event_type(&self) -> &str {
        match self {
            InnerEvent::AppMention(_) => APP_MENTION,
            InnerEvent::Other { event_type } => event_type,
        }
    }
}

/// Event payload for app mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMentionEvent {
    /// User who mentioned the bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Text of the message (including the mention).
    #[serde(default)]
    pub text: String,
    /// Channel where the mention occurred.
    pub channel: String,
    /// Timestamp of the message.
    pub ts: String,
    /// Thread timestamp (if the mention is a thread reply).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Event timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ts: Option<String>,
}

impl AppMentionEvent {
    /// Timestamp of the thread a reply should go to.
    ///
    /// Replies join the existing thread, or start one on the mention itself.
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

#[derive(Debug, Deserialize)]
struct RawEventCallback {
    #[serde(default)]
    team_id: Option<String>,
    #[serde(default)]
    api_app_id: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    event_time: Option<i64>,
    event: serde_json::Value,
}

/// Decode a delivery body into an [`EventEnvelope`].
pub fn parse_envelope(body: &[u8]) -> Result<EventEnvelope, ParseError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let envelope_type = type_field(&value)?.to_string();

    debug!("Parsing envelope type: {}", envelope_type);

    match envelope_type.as_str() {
        URL_VERIFICATION => {
            let verification: UrlVerification = serde_json::from_value(value)?;
            Ok(EventEnvelope::UrlVerification(verification))
        }
        EVENT_CALLBACK => {
            let raw: RawEventCallback = serde_json::from_value(value)?;
            Ok(EventEnvelope::EventCallback(EventCallback {
                team_id: raw.team_id,
                api_app_id: raw.api_app_id,
                event_id: raw.event_id,
                event_time: raw.event_time,
                event: parse_inner_event(raw.event)?,
            }))
        }
        other => Err(ParseError::UnrecognizedEnvelope(other.to_string())),
    }
}

/// Decode the event wrapped by a callback.
pub fn parse_inner_event(value: serde_json::Value) -> Result<InnerEvent, ParseError> {
    let event_type = type_field(&value)?.to_string();

    debug!("Parsing event type: {}", event_type);

    match event_type.as_str() {
        APP_MENTION => Ok(InnerEvent::AppMention(serde_json::from_value(value)?)),
        _ => Ok(InnerEvent::Other { event_type }),
    }
}

fn type_field(value: &serde_json::Value) -> Result<&str, ParseError> {
    if !value.is_object() {
        return Err(ParseError::Malformed("expected a JSON object".to_string()));
    }
    value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| ParseError::Malformed("missing type field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_MENTION_BODY: &str = r#"{
        "token": "ZZZZZZWSxiZZZ2yIvs3peJ",
        "team_id": "T061EG9R6",
        "api_app_id": "A0MDYCDME",
        "event": {
            "type": "app_mention",
            "user": "W021FGA1Z",
            "text": "<@U0LAN0Z89> quote DOCN AAPL GOOG. :pray:",
            "ts": "1515449483.000108",
            "channel": "C0LAN2Q65",
            "event_ts": "1515449483000108"
        },
        "type": "event_callback",
        "event_id": "Ev0MDYHUEL",
        "event_time": 1515449483000108,
        "authed_users": ["U0LAN0Z89"]
    }"#;

    #[test]
    fn test_parse_url_verification() {
        let body = br#"{"token":"Jhj5dZrVaK7ZwHHjRyZWjbDl","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#;

        assert_eq!(
            parse_envelope(body).unwrap(),
            EventEnvelope::UrlVerification(UrlVerification {
                challenge: "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".to_string()
            })
        );
    }

    #[test]
    fn test_parse_app_mention_callback() {
        let envelope = parse_envelope(APP_MENTION_BODY.as_bytes()).unwrap();

        let EventEnvelope::EventCallback(callback) = envelope else {
            panic!("Expected event callback");
        };
        assert_eq!(callback.team_id.as_deref(), Some("T061EG9R6"));
        assert_eq!(callback.event_id.as_deref(), Some("Ev0MDYHUEL"));

        let InnerEvent::AppMention(mention) = callback.event else {
            panic!("Expected app mention");
        };
        assert_eq!(mention.channel, "C0LAN2Q65");
        assert_eq!(mention.ts, "1515449483.000108");
        assert_eq!(mention.text, "<@U0LAN0Z89> quote DOCN AAPL GOOG. :pray:");
        assert_eq!(mention.user.as_deref(), Some("W021FGA1Z"));
    }

    #[test]
    fn test_parse_other_inner_event() {
        let body = br#"{"type":"event_callback","event":{"type":"reaction_added","user":"U1","reaction":"thumbsup"}}"#;

        let EventEnvelope::EventCallback(callback) = parse_envelope(body).unwrap() else {
            panic!("Expected event callback");
        };
        assert_eq!(
            callback.event,
            InnerEvent::Other {
                event_type: "reaction_added".to_string()
            }
        );
        assert_eq!(callback.event.event_type(), "reaction_added");
    }

    #[test]
    fn test_parse_unrecognized_envelope() {
        let body = br#"{"type":"app_rate_limited","minute_rate_limited":1518467820}"#;
        assert_eq!(
            parse_envelope(body),
            Err(ParseError::UnrecognizedEnvelope("app_rate_limited".to_string()))
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_envelope(b"not json"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_envelope(br#"["url_verification"]"#),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{"challenge":"X"}"#),
            Err(ParseError::Malformed(_))
        ));
        // Known envelope type with a missing required field.
        assert!(matches!(
            parse_envelope(br#"{"type":"url_verification"}"#),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{"type":"event_callback","event":{"type":"app_mention","text":"hi"}}"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_legacy_token_is_not_checked() {
        let body = br#"{"token":"anything-at-all","challenge":"X","type":"url_verification"}"#;
        assert!(parse_envelope(body).is_ok());
    }

    #[test]
    fn test_reply_thread_ts() {
        let mut mention = AppMentionEvent {
            user: None,
            text: "<@B00000> DOCN".to_string(),
            channel: "C67890".to_string(),
            ts: "1234567890.123456".to_string(),
            thread_ts: None,
            event_ts: None,
        };
        assert_eq!(mention.reply_thread_ts(), "1234567890.123456");

        mention.thread_ts = Some("1234567890.000000".to_string());
        assert_eq!(mention.reply_thread_ts(), "1234567890.000000");
    }

    #[test]
    fn test_challenge_response_shape() {
        let response = ChallengeResponse {
            challenge: "X".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"Challenge":"X"}"#
        );
    }
}
