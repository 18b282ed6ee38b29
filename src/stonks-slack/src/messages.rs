//! Message formatting for Slack.
//!
//! Provides:
//! - The Block Kit subset quote replies are built from
//! - A builder for block messages
//! - The reply composers used by the event handler

use serde::{Deserialize, Serialize};
use stonks_market::Quote;

/// Intro line above a list of quotes.
pub const QUOTES_INTRO_TEXT: &str = "Found the following quotes :chart_with_upwards_trend:";

/// Reply when a mention names no usable symbols.
pub const NO_SYMBOLS_TEXT: &str =
    "Sorry, I didn't find any valid market symbols in your message. :cry:";

/// Best-effort reply after a failed response.
pub const APOLOGY_TEXT: &str = "Sorry, I messed something up... Try again later :poop:";

/// Slack Block Kit block types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Header block.
    Header { text: SlackTextObject },
    /// Section block (main content).
    Section { text: SlackTextObject },
    /// Divider block.
    Divider {},
}

/// Slack text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackTextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbatim: Option<bool>,
}

impl SlackTextObject {
    /// Create a plain text object.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
            emoji: Some(true),
            verbatim: None,
        }
    }

    /// Create a mrkdwn text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
            verbatim: None,
        }
    }

    /// Create a mrkdwn text object Slack will not auto-link or re-parse.
    pub fn verbatim(text: impl Into<String>) -> Self {
        Self {
            verbatim: Some(true),
            ..Self::mrkdwn(text)
        }
    }
}

/// Slack message content with blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackMessageContent {
    /// Plain text, or fallback text for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Block Kit blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<SlackBlock>>,
    /// Thread timestamp (for replies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Whether to also send to channel when in thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_broadcast: Option<bool>,
}

impl SlackMessageContent {
    /// Create a new message content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set thread timestamp (for replies).
    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    /// Broadcast to channel as well as thread.
    pub fn broadcast(mut self) -> Self {
        self.reply_broadcast = Some(true);
        self
    }
}

/// Builder for creating rich Slack messages.
#[derive(Debug, Default)]
pub struct SlackMessageBuilder {
    blocks: Vec<SlackBlock>,
}

impl SlackMessageBuilder {
    /// Create a new message builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header block.
    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Header {
            text: SlackTextObject::plain(text),
        });
        self
    }

    /// Add a section with mrkdwn text.
    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Section {
            text: SlackTextObject::mrkdwn(text),
        });
        self
    }

    /// Add a section with verbatim mrkdwn text.
    pub fn verbatim_section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Section {
            text: SlackTextObject::verbatim(text),
        });
        self
    }

    /// Add a divider.
    pub fn divider(mut self) -> Self {
        self.blocks.push(SlackBlock::Divider {});
        self
    }

    /// Build the message content.
    pub fn build(self) -> SlackMessageContent {
        SlackMessageContent {
            blocks: Some(self.blocks),
            ..Default::default()
        }
    }
}

/// Format a number with two decimals and an explicit sign when non-zero.
///
/// ```rust
/// use stonks_slack::messages::format_signed;
///
/// assert_eq!(format_signed(1.234), "+1.23");
/// assert_eq!(format_signed(-0.5), "-0.50");
/// assert_eq!(format_signed(0.0), "0.00");
/// ```
pub fn format_signed(value: f64) -> String {
    let magnitude = format!("{:.2}", value.abs());
    if magnitude == "0.00" {
        magnitude
    } else if value.is_sign_negative() {
        format!("-{magnitude}")
    } else {
        format!("+{magnitude}")
    }
}

/// Summary line for one quote: price, change and percent change, in bold.
pub fn format_quote_line(quote: &Quote) -> String {
    format!(
        "*{:.2} {} ({}%)*",
        quote.price,
        format_signed(quote.change),
        format_signed(quote.change_percent)
    )
}

/// Query-component escaping: unreserved characters kept, spaces as `+`,
/// everything else percent-encoded.
///
/// ```rust
/// use stonks_slack::messages::query_escape;
///
/// assert_eq!(query_escape("*1.00 +2.00*"), "%2A1.00+%2B2.00%2A");
/// ```
pub fn query_escape(text: &str) -> String {
    // A literal '%' is encoded as %25, so "%20" only ever comes from a space.
    urlencoding::encode(text).replace("%20", "+")
}

/// Build the reply for a mention.
///
/// No quotes yields the plain "no valid symbols" text. Otherwise an intro
/// section is followed, per quote, by a header with the name and symbol and
/// a percent-encoded summary line, with dividers between quotes.
pub fn format_quotes_reply(quotes: &[Quote]) -> SlackMessageContent {
    if quotes.is_empty() {
        return format_no_symbols_reply();
    }

    let mut builder = SlackMessageBuilder::new().section(QUOTES_INTRO_TEXT);

    for (i, quote) in quotes.iter().enumerate() {
        builder = builder
            .header(format!("{} ({})", quote.display_name(), quote.symbol))
            .verbatim_section(query_escape(&format_quote_line(quote)));

        if i != quotes.len() - 1 {
            builder = builder.divider();
        }
    }

    builder.build()
}

/// Reply for a mention without usable symbols.
pub fn format_no_symbols_reply() -> SlackMessageContent {
    SlackMessageContent::new().with_text(NO_SYMBOLS_TEXT)
}

/// Best-effort notice sent when replying failed.
pub fn format_apology() -> SlackMessageContent {
    SlackMessageContent::new().with_text(APOLOGY_TEXT)
}
