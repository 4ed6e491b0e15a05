//! HTTP Server and Scrape Orchestration
//!
//! This module implements the Prometheus exporter HTTP server. Every `/metrics`
//! request drives one scrape of the vSphere inventory.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Scrape**: a fresh [`MetricsCollector`] per request, filled by every enabled
//!   collector running concurrently, then rendered
//! - **State Management**: config, API client and ancestry cache shared through `Arc`
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format (503 when too many scrapes are in flight)
//! - `GET /health` - 200 if the last scrape had a successful collector, 503 otherwise
//!
//! # Error Handling
//!
//! Collector failures are logged and reported through
//! `vsphere_scrape_collector_success`; the rest of the scrape is still exposed.
//! `vsphere_up` is 0 when every enabled collector failed.

use crate::ancestry::AncestryCache;
use crate::collectors::{self, CollectionContext};
use crate::config::{Config, MetricsConfig};
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::vsphere::{InventoryApi, VsphereClient};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// State shared by the HTTP handlers
pub struct AppState<A> {
    config: Arc<Config>,
    api: Arc<A>,
    cache: Arc<AncestryCache>,
    limiter: Arc<Semaphore>,
    /// Outcome of the last scrape
    healthy: Arc<AtomicBool>,
}

// Derived Clone would require `A: Clone`
impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
            limiter: Arc::clone(&self.limiter),
            healthy: Arc::clone(&self.healthy),
        }
    }
}

impl<A: InventoryApi + 'static> AppState<A> {
    pub fn new(config: Config, api: A) -> Self {
        let limiter = Arc::new(Semaphore::new(config.server.max_requests));
        Self {
            config: Arc::new(config),
            api: Arc::new(api),
            cache: Arc::new(AncestryCache::new()),
            limiter,
            healthy: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Rendered result of one scrape
#[derive(Debug)]
pub struct ScrapeOutcome {
    /// Prometheus text exposition
    pub body: String,
    /// At least one collector succeeded
    pub up: bool,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    // Collectors are bounded by the scrape timeout; HTTP calls get the same deadline.
    let timeout = Duration::from_secs(config.metrics.scrape_timeout_seconds);
    let client = VsphereClient::new(config.vsphere.clone(), timeout)?;

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let app = router(AppState::new(config, client));

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!("Cannot bind {}: {}", addr, e);
        ExporterError::Io(e)
    })?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

/// Build the exporter routes over `state`
pub fn router<A: InventoryApi + 'static>(state: AppState<A>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler::<A>))
        .route("/health", get(health_handler::<A>))
        .with_state(state)
}

/// Run one scrape of every enabled collector and render the result
pub async fn scrape<A: InventoryApi>(
    api: &A,
    cache: &AncestryCache,
    config: &MetricsConfig,
) -> anyhow::Result<ScrapeOutcome> {
    let start = Instant::now();
    let metrics = MetricsCollector::new(config)?;

    let ctx = CollectionContext {
        api,
        cache,
        metrics: &metrics,
        config,
    };
    let up = collectors::collect_all(&ctx).await;
    metrics.up.set(if up { 1.0 } else { 0.0 });

    if up {
        info!("Scrape completed in {:.3}s", start.elapsed().as_secs_f64());
    } else {
        warn!(
            "Every collector failed against {} - check connectivity and credentials",
            api.endpoint()
        );
    }

    Ok(ScrapeOutcome {
        body: metrics.render()?,
        up,
    })
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>vSphere Exporter</title></head>
<body>
<h1>vSphere Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler<A: InventoryApi + 'static>(State(state): State<AppState<A>>) -> Response {
    let Ok(_permit) = state.limiter.clone().try_acquire_owned() else {
        warn!(
            "Rejecting scrape: {} scrapes already in flight",
            state.config.server.max_requests
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many concurrent scrapes").into_response();
    };

    match scrape(state.api.as_ref(), &state.cache, &state.config.metrics).await {
        Ok(outcome) => {
            state.healthy.store(outcome.up, Ordering::Relaxed);
            (
                [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
                outcome.body,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            state.healthy.store(false, Ordering::Relaxed);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler<A: InventoryApi + 'static>(
    State(state): State<AppState<A>>,
) -> impl IntoResponse {
    if state.healthy.load(Ordering::Relaxed) {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "vSphere API unreachable")
    }
}
