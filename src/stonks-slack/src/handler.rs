//! Events API endpoint.
//!
//! Every delivery runs the same pipeline inside its own request:
//! verify the signature, decode the envelope, then either answer the URL
//! verification handshake or act on an `app_mention` by looking up quotes
//! and replying in the mention's thread. Failures are rendered as
//! `{"status_code": <int>, "error": "<message>"}`.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use serde::{Deserialize, Serialize};
use stonks_market::{MarketError, Quote, QuoteBackend};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::client::MessagePoster;
use crate::error::SlackError;
use crate::events::{
    AppMentionEvent, ChallengeResponse, EventEnvelope, InnerEvent, ParseError, parse_envelope,
};
use crate::messages::{SlackMessageContent, format_apology, format_quotes_reply};
use crate::signature::{AuthError, SignatureVerifier, Verification};
use crate::symbols::symbols_in_text;

/// Path Slack is configured to deliver events to.
pub const EVENTS_PATH: &str = "/slack/event";

/// Default bound on the external calls made for one delivery.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on the apology sent after a failed reply.
pub const DEFAULT_APOLOGY_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal failure of a delivery.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Only POST is accepted.
    #[error("invalid method: {0}")]
    MethodNotAllowed(Method),

    /// The request body could not be read.
    #[error("reading body: {0}")]
    ReadBody(String),

    /// Signature verification failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// The body is not a valid envelope.
    #[error("parsing payload: {0}")]
    Payload(String),

    /// Envelope or inner event of a kind we don't act on.
    #[error("unhandled event: {0}")]
    UnhandledEvent(String),

    /// The quote backend failed.
    #[error("getting quotes: {0}")]
    Quotes(MarketError),

    /// Posting the reply failed.
    #[error("responding to mention: {0}")]
    Respond(SlackError),
}

impl From<ParseError> for DispatchError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Malformed(msg) => Self::Payload(msg),
            ParseError::UnrecognizedEnvelope(kind) => Self::UnhandledEvent(kind),
        }
    }
}

impl DispatchError {
    /// HTTP status for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Auth(AuthError::Missing(_)) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::Invalid(_)) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::Expired { .. }) => StatusCode::FORBIDDEN,
            Self::Auth(AuthError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnhandledEvent(_) => StatusCode::NOT_IMPLEMENTED,
            Self::ReadBody(_) | Self::Payload(_) | Self::Quotes(_) | Self::Respond(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Error message.
    pub error: String,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status_code: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Successful end of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handshake answered with the echoed challenge.
    Challenge(String),
    /// Event processed; the body is an empty object.
    Acknowledged,
}

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Challenge(challenge) => Json(ChallengeResponse { challenge }).into_response(),
            Self::Acknowledged => Json(serde_json::json!({})).into_response(),
        }
    }
}

/// Tunables for [`EventHandler`].
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// Deadline for the backend and outbound calls of one delivery.
    pub request_timeout: Duration,
    /// Budget for the apology, counted from when the reply failed.
    pub apology_timeout: Duration,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            apology_timeout: DEFAULT_APOLOGY_TIMEOUT,
        }
    }
}

/// Shared, read-only state for the events endpoint.
pub struct EventHandler {
    verifier: SignatureVerifier,
    backend: Arc<dyn QuoteBackend>,
    poster: Arc<dyn MessagePoster>,
    options: HandlerOptions,
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("verifier", &self.verifier)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EventHandler {
    /// Create a handler. An empty `signing_secret` disables verification.
    pub fn new(
        signing_secret: impl Into<String>,
        backend: Arc<dyn QuoteBackend>,
        poster: Arc<dyn MessagePoster>,
    ) -> Self {
        Self {
            verifier: SignatureVerifier::new(signing_secret),
            backend,
            poster,
            options: HandlerOptions::default(),
        }
    }

    /// Replace the handler options.
    pub fn with_options(mut self, options: HandlerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the signature verifier.
    pub fn with_verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Whether deliveries are signature-checked.
    pub fn verifies_signatures(&self) -> bool {
        self.verifier.is_enabled()
    }

    /// Run one delivery through the pipeline.
    pub async fn dispatch(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<DispatchOutcome, DispatchError> {
        if *method != Method::POST {
            return Err(DispatchError::MethodNotAllowed(method.clone()));
        }

        match self.verifier.verify(headers, body)? {
            Verification::Verified => {}
            Verification::Skipped => {
                warn!(trust = "unverified", "Accepting delivery without signature verification")
            }
        }

        match parse_envelope(body)? {
            EventEnvelope::UrlVerification(verification) => {
                info!("Answering URL verification handshake");
                Ok(DispatchOutcome::Challenge(verification.challenge))
            }
            EventEnvelope::EventCallback(callback) => match callback.event {
                InnerEvent::AppMention(mention) => {
                    self.handle_mention(&mention).await?;
                    Ok(DispatchOutcome::Acknowledged)
                }
                InnerEvent::Other { event_type } => Err(DispatchError::UnhandledEvent(event_type)),
            },
        }
    }

    async fn handle_mention(&self, mention: &AppMentionEvent) -> Result<(), DispatchError> {
        let deadline = Instant::now() + self.options.request_timeout;

        let symbols = symbols_in_text(&mention.text);
        debug!(
            channel = %mention.channel,
            ts = %mention.ts,
            symbols = ?symbols,
            "Handling app mention"
        );

        let quotes = self.lookup_quotes(&symbols, deadline).await?;
        let reply = format_quotes_reply(&quotes);

        if let Err(err) = self.reply(mention, reply, deadline).await {
            // The request deadline may already be spent.
            let apology_deadline = Instant::now() + self.options.apology_timeout;
            if let Err(apology_err) = self
                .reply(mention, format_apology(), apology_deadline)
                .await
            {
                warn!(error = %apology_err, "Failed to send apology");
            }
            return Err(DispatchError::Respond(err));
        }

        Ok(())
    }

    async fn lookup_quotes(
        &self,
        symbols: &[String],
        deadline: Instant,
    ) -> Result<Vec<Quote>, DispatchError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        match timeout_at(deadline, self.backend.quote(symbols)).await {
            Ok(result) => result.map_err(DispatchError::Quotes),
            Err(_) => Err(DispatchError::Quotes(MarketError::Timeout(
                "quote lookup exceeded the request deadline".to_string(),
            ))),
        }
    }

    async fn reply(
        &self,
        mention: &AppMentionEvent,
        content: SlackMessageContent,
        deadline: Instant,
    ) -> Result<String, SlackError> {
        let content = content.in_thread(mention.reply_thread_ts()).broadcast();

        match timeout_at(deadline, self.poster.post_message(&mention.channel, content)).await {
            Ok(result) => result,
            Err(_) => Err(SlackError::Timeout(
                "posting the reply exceeded the request deadline".to_string(),
            )),
        }
    }
}

/// Router serving the events endpoint.
pub fn routes(handler: Arc<EventHandler>) -> Router {
    Router::new()
        .route(EVENTS_PATH, any(handle_event))
        .with_state(handler)
}

async fn handle_event(
    State(handler): State<Arc<EventHandler>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = match body {
        _ if method != Method::POST => Err(DispatchError::MethodNotAllowed(method.clone())),
        Ok(body) => handler.dispatch(&method, &headers, &body).await,
        Err(rejection) => Err(DispatchError::ReadBody(rejection.body_text())),
    };

    match result {
        Ok(outcome) => outcome.into_response(),
        Err(err) => {
            warn!(
                method = %method,
                path = %uri.path(),
                status = err.status_code().as_u16(),
                error = %err,
                "Failed to handle event"
            );
            err.into_response()
        }
    }
}
