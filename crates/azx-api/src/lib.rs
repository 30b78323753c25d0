//! azx-api — HTTP surface of the Azure exporter.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page linking to the telemetry path |
//! | GET | telemetry path (default `/metrics`) | Runs a scrape cycle, returns Prometheus text |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use azx_scrape::ScrapeCoordinator;

/// Shared state for the handlers.
#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<ScrapeCoordinator>,
    /// Metric name prefix.
    pub namespace: Arc<str>,
    pub telemetry_path: Arc<str>,
}

/// Build the exporter router.
pub fn build_router(
    coordinator: Arc<ScrapeCoordinator>,
    namespace: &str,
    telemetry_path: &str,
) -> Router {
    let state = ApiState {
        coordinator,
        namespace: Arc::from(namespace),
        telemetry_path: Arc::from(telemetry_path),
    };

    Router::new()
        .route("/", get(handlers::landing_page))
        .route(telemetry_path, get(handlers::prometheus_metrics))
        .with_state(state)
}
