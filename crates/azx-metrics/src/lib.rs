//! azx-metrics — VPN connection metrics for the Azure exporter.
//!
//! # Architecture
//!
//! ```text
//! MetricsSnapshot
//!   ├── apply_cycle() ← scrape coordinator, once per successful cycle
//!   ├── mark_down()   ← scrape coordinator, when the list call fails
//!   └── read()        → SnapshotData copy
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the telemetry endpoint
//! ```

pub mod prometheus;
pub mod snapshot;

pub use prometheus::render_prometheus;
pub use snapshot::{LabelKey, MetricsSnapshot, Observation, SnapshotData, VpnSeries};
