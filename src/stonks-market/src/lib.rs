//! Market data for the stonks Slack bot.
//!
//! This crate provides:
//! - The [`Quote`] model returned by every backend
//! - The [`QuoteBackend`] trait the Slack handler looks quotes up through
//! - [`YahooBackend`], backed by the Yahoo Finance quote endpoint
//! - [`FakeBackend`], which echoes a canned quote for local runs and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use stonks_market::{QuoteBackend, YahooBackend};
//!
//! let backend = YahooBackend::new()?;
//! let quotes = backend.quote(&["AAPL".to_string()]).await?;
//! ```

pub mod error;
pub mod fake;
pub mod quote;
pub mod yahoo;

pub use error::{MarketError, MarketResult};
pub use fake::FakeBackend;
pub use quote::{Quote, QuoteBackend};
pub use yahoo::YahooBackend;
