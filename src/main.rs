//! Pulseboard Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - PULSEBOARD_HOST: Bind address (default: 0.0.0.0)
//! - PULSEBOARD_PORT: Port number (default: 8080)
//! - PULSEBOARD_QUOTE_URL: Market quote endpoint (default: Yahoo v7 quote API)
//! - PULSEBOARD_QUOTE_SYMBOLS: Comma-separated tickers (default: AAPL,MSFT,GOOGL,AMZN,TSLA)
//! - PULSEBOARD_NOTIFY_WEBHOOK: Alert notification webhook (default: log only)
//! - PULSEBOARD_FETCH_TIMEOUT_SECS: Outbound HTTP timeout (default: 10)
//! - PULSEBOARD_RETENTION_HOURS: How long readings are kept (default: 168)
//! - PULSEBOARD_FINANCE_INTERVAL_SECS, PULSEBOARD_SENSOR_INTERVAL_SECS,
//!   PULSEBOARD_WEATHER_INTERVAL_SECS, PULSEBOARD_SYSTEM_INTERVAL_SECS,
//!   PULSEBOARD_CUSTOM_INTERVAL_SECS: Poll interval per source kind
//!   (defaults: 5, 7, 10, 6, 8)
//! - RUST_LOG: Log level (default: info)

use std::time::Duration;

use pulseboard::api::{run_server, ServerConfig};
use pulseboard::scheduler::PollIntervals;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_interval(name: &str, default: Duration) -> Duration {
    env_u64(name)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulseboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let defaults = ServerConfig::default();

    // Parse configuration from environment
    let host = std::env::var("PULSEBOARD_HOST").unwrap_or(defaults.host);
    let port: u16 = std::env::var("PULSEBOARD_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults.port);
    let quote_url = std::env::var("PULSEBOARD_QUOTE_URL").unwrap_or(defaults.quote_url);
    let quote_symbols: Vec<String> = std::env::var("PULSEBOARD_QUOTE_SYMBOLS")
        .ok()
        .map(|list| {
            list.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .filter(|symbols: &Vec<String>| !symbols.is_empty())
        .unwrap_or(defaults.quote_symbols);
    let notify_webhook = std::env::var("PULSEBOARD_NOTIFY_WEBHOOK")
        .ok()
        .filter(|url| !url.trim().is_empty());

    let d = PollIntervals::default();
    let intervals = PollIntervals {
        finance: env_interval("PULSEBOARD_FINANCE_INTERVAL_SECS", d.finance),
        sensor: env_interval("PULSEBOARD_SENSOR_INTERVAL_SECS", d.sensor),
        weather: env_interval("PULSEBOARD_WEATHER_INTERVAL_SECS", d.weather),
        system: env_interval("PULSEBOARD_SYSTEM_INTERVAL_SECS", d.system),
        custom: env_interval("PULSEBOARD_CUSTOM_INTERVAL_SECS", d.custom),
    };

    let config = ServerConfig {
        host,
        port,
        quote_url,
        quote_symbols,
        notify_webhook,
        fetch_timeout_secs: env_u64("PULSEBOARD_FETCH_TIMEOUT_SECS")
            .unwrap_or(defaults.fetch_timeout_secs),
        retention_hours: env_u64("PULSEBOARD_RETENTION_HOURS").unwrap_or(defaults.retention_hours),
        retention_check_interval_secs: defaults.retention_check_interval_secs,
        intervals,
    };

    tracing::info!("Pulseboard configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Quote endpoint: {}", config.quote_url);
    tracing::info!("  Quote symbols: {}", config.quote_symbols.join(","));
    tracing::info!(
        "  Notifications: {}",
        config.notify_webhook.as_deref().unwrap_or("log only")
    );
    tracing::info!("  Fetch timeout: {} seconds", config.fetch_timeout_secs);
    tracing::info!(
        "  Retention: {} hours (checked every {} seconds)",
        config.retention_hours,
        config.retention_check_interval_secs
    );
    tracing::info!(
        "  Poll intervals: finance={:?} sensor={:?} weather={:?} system={:?} custom={:?}",
        config.intervals.finance,
        config.intervals.sensor,
        config.intervals.weather,
        config.intervals.system,
        config.intervals.custom
    );

    run_server(config).await
}
