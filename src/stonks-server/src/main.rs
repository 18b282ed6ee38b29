//! stonks - Slack bot that replies to mentions with market quotes.

use std::process::ExitCode;

use clap::Parser;
use stonks_server::{MarketBackendKind, ServerConfig, run_with_shutdown};
use stonks_slack::SlackConfig;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// stonks Slack bot server
#[derive(Parser)]
#[command(name = "stonks")]
#[command(about = "Replies to Slack mentions with market quotes")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Slack bot token (xoxb-...)
    #[arg(long, env = "SLACK_BOT_TOKEN", default_value = "", hide_env_values = true)]
    slack_bot_token: String,

    /// Slack signing secret for request verification
    #[arg(
        long,
        env = "SLACK_SIGNING_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    slack_signing_secret: String,

    /// Slack Web API base URL
    #[arg(long, env = "SLACK_API_URL")]
    slack_api_url: Option<String>,

    /// Quote backend
    #[arg(long, env = "STONKS_MARKET_BACKEND", value_enum, default_value_t = MarketBackendKind::Yahoo)]
    market_backend: MarketBackendKind,

    /// Accept event deliveries without a signing secret.
    ///
    /// An empty signing secret on its own does not disable verification:
    /// without this flag the server refuses to start.
    #[arg(long, env = "STONKS_ALLOW_UNSIGNED")]
    allow_unsigned: bool,

    /// Per-delivery timeout for quote lookups and replies, in seconds
    #[arg(long, default_value_t = 10)]
    request_timeout: u64,

    /// Graceful shutdown timeout, in seconds
    #[arg(long, default_value_t = 15)]
    shutdown_timeout: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.addr.clone(),
            request_timeout: self.request_timeout,
            shutdown_timeout: self.shutdown_timeout,
            market_backend: self.market_backend,
            allow_unsigned: self.allow_unsigned,
            ..Default::default()
        }
    }

    fn slack_config(&self) -> SlackConfig {
        let config = SlackConfig::new(&self.slack_bot_token, &self.slack_signing_secret);
        match &self.slack_api_url {
            Some(url) => config.with_api_url(url),
            None => config,
        }
    }
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    let config = args.server_config();
    let slack = args.slack_config();

    info!("Graceful shutdown timeout: {}s", config.shutdown_timeout);
    info!("Press Ctrl+C to stop");

    if let Err(e) = run_with_shutdown(config, slack, shutdown_signal()).await {
        error!("Server error: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
