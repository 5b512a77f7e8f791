use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_check, history, list_custom_sources, register_api, stats, AppState,
};
use super::live::live_handler;
use crate::alerts::{LogNotifier, Notifier, WebhookNotifier};
use crate::compaction::RetentionWorker;
use crate::fetch::{
    quote::{DEFAULT_QUOTE_URL, QUOTE_SYMBOLS},
    CustomFetcher, CustomSourceRegistry, HostMetricsFetcher,
    QuoteFetcher, SyntheticFetcher,
};
use crate::scheduler::{PollIntervals, Scheduler, SourcePoller};
use crate::storage::MemoryStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub quote_url: String,
    pub quote_symbols: Vec<String>,
    pub notify_webhook: Option<String>,
    pub fetch_timeout_secs: u64,
    pub retention_hours: u64,
    pub retention_check_interval_secs: u64,
    pub intervals: PollIntervals,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            quote_symbols: QUOTE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            notify_webhook: None,
            fetch_timeout_secs: 10,
            retention_hours: 168, // 7 days, the longest history window
            retention_check_interval_secs: 300,
            intervals: PollIntervals::default(),
        }
    }
}

/// The built-in pollers every live session runs: quotes, sensors,
/// weather, host metrics and the custom sources registry
pub fn default_pollers(
    config: &ServerConfig,
    client: reqwest::Client,
    custom_sources: Arc<CustomSourceRegistry>,
) -> Vec<SourcePoller> {
    let intervals = &config.intervals;
    vec![
        SourcePoller {
            fetcher: Arc::new(
                QuoteFetcher::new(client.clone(), config.quote_url.clone())
                    .with_symbols(config.quote_symbols.clone()),
            ),
            interval: intervals.finance,
        },
        SourcePoller {
            fetcher: Arc::new(SyntheticFetcher::sensors()),
            interval: intervals.sensor,
        },
        SourcePoller {
            fetcher: Arc::new(SyntheticFetcher::weather()),
            interval: intervals.weather,
        },
        SourcePoller {
            fetcher: Arc::new(HostMetricsFetcher::new()),
            interval: intervals.system,
        },
        SourcePoller {
            fetcher: Arc::new(CustomFetcher::new(client, custom_sources)),
            interval: intervals.custom,
        },
    ]
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Custom sources
        .route("/register-api", post(register_api))
        .route("/custom-sources", get(list_custom_sources))
        // History
        .route("/history/:source/:symbol", get(history))
        // Live channel
        .route("/live", get(live_handler))
        // Stats
        .route("/stats", get(stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    // Initialize store
    let store = Arc::new(MemoryStore::new());

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook {
        Some(url) => {
            tracing::info!("Alert notifications delivered to webhook {}", url);
            Arc::new(WebhookNotifier::new(client.clone(), url.clone()))
        }
        None => {
            tracing::info!("No notification webhook configured, alert notifications are logged");
            Arc::new(LogNotifier)
        }
    };

    let custom_sources = Arc::new(CustomSourceRegistry::new());
    let pollers = default_pollers(&config, client, Arc::clone(&custom_sources));

    // Initialize app state
    let state = Arc::new(AppState::new(
        store.clone(),
        notifier,
        custom_sources,
        pollers,
    ));

    // Start background workers
    let retention_worker = Arc::new(RetentionWorker::new(
        Arc::clone(&store),
        Duration::from_secs(config.retention_hours * 3600),
        Duration::from_secs(config.retention_check_interval_secs),
    ));
    let retention_handle = Arc::clone(&retention_worker).start();

    // Build router
    let app = build_router(Arc::clone(&state));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting Pulseboard server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            retention_worker,
            Arc::clone(&state.scheduler),
        ))
        .await?;

    retention_handle.abort();

    tracing::info!("Pulseboard server stopped");
    Ok(())
}

async fn shutdown_signal(retention_worker: Arc<RetentionWorker>, scheduler: Arc<Scheduler>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        return;
    }

    tracing::info!("Shutdown signal received, stopping workers...");
    retention_worker.stop();
    let ended = scheduler.shutdown();
    tracing::info!("Ended {} live sessions", ended);
}
