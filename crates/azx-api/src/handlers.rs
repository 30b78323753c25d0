//! Route handlers.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};
use tracing::debug;

use azx_metrics::render_prometheus;

use crate::ApiState;

/// GET /
pub async fn landing_page(State(state): State<ApiState>) -> impl IntoResponse {
    Html(format!(
        "<html>\n\
         <head><title>Azure Exporter</title></head>\n\
         <body>\n\
         <h1>Azure Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.telemetry_path
    ))
}

/// GET <telemetry path>
///
/// Blocks until a full scrape cycle has finished. A failed cycle still
/// answers 200 with the best data available; `up` reports the failure.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let data = state.coordinator.collect().await;
    debug!(series = data.series.len(), up = data.up, "serving metrics");
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render_prometheus(&state.namespace, &data),
    )
}
