//! Scrape coordinator — drives one full polling cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, warn};

use azx_core::VpnConnection;
use azx_metrics::{LabelKey, MetricsSnapshot, Observation, SnapshotData};

use crate::source::ConnectionSource;

/// Outcome of one scrape cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether the list call succeeded.
    pub up: bool,
    /// Connections returned by the list call.
    pub listed: usize,
    /// Connections whose series were updated.
    pub updated: usize,
    /// Connections whose detail fetch failed or did not finish in time.
    pub failed: usize,
}

/// Runs scrape cycles against a [`ConnectionSource`] and writes the
/// results into a shared [`MetricsSnapshot`].
pub struct ScrapeCoordinator {
    source: Arc<dyn ConnectionSource>,
    snapshot: Arc<MetricsSnapshot>,
    /// Held for the duration of a cycle; at most one cycle is in flight.
    cycle_lock: Mutex<()>,
    cycle_deadline: Duration,
}

impl ScrapeCoordinator {
    pub fn new(
        source: Arc<dyn ConnectionSource>,
        snapshot: Arc<MetricsSnapshot>,
        cycle_deadline: Duration,
    ) -> Self {
        Self {
            source,
            snapshot,
            cycle_lock: Mutex::new(()),
            cycle_deadline,
        }
    }

    pub fn snapshot(&self) -> &Arc<MetricsSnapshot> {
        &self.snapshot
    }

    /// Run one cycle and return a copy of the resulting snapshot.
    ///
    /// Concurrent callers queue behind the cycle in flight.
    pub async fn collect(&self) -> SnapshotData {
        let _cycle = self.cycle_lock.lock().await;
        self.run_cycle().await;
        self.snapshot.read().await
    }

    /// Run one cycle.
    pub async fn scrape(&self) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let deadline = started + self.cycle_deadline;

        // Listing.
        let conns = match timeout_at(deadline, self.source.list_connections()).await {
            Ok(Ok(conns)) => conns,
            Ok(Err(e)) => {
                error!(error = %e, "unable to find vpn connections in azure");
                self.snapshot.mark_down().await;
                return CycleReport::default();
            }
            Err(_) => {
                error!(deadline = ?self.cycle_deadline, "listing vpn connections timed out");
                self.snapshot.mark_down().await;
                return CycleReport::default();
            }
        };
        let listed = conns.len();
        debug!(listed, "fetching vpn connection details");

        // FetchingDetails.
        let mut tasks = JoinSet::new();
        for conn in conns {
            let source = Arc::clone(&self.source);
            tasks.spawn(async move {
                let detail = source.get_connection(&conn.resource_group, &conn.name).await;
                (conn, detail)
            });
        }

        let mut observations = Vec::with_capacity(listed);
        let mut failed = 0;
        let drain = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((conn, Ok(detail))) => observations.push(observe(&conn, &detail)),
                    Ok((conn, Err(e))) => {
                        warn!(
                            error = %e,
                            name = %conn.name,
                            group = %conn.resource_group,
                            "unable to retrieve vpn connection from azure"
                        );
                        failed += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "vpn connection fetch task failed");
                        failed += 1;
                    }
                }
            }
        };
        if timeout_at(deadline, drain).await.is_err() {
            let pending = tasks.len();
            warn!(
                pending,
                deadline = ?self.cycle_deadline,
                "scrape deadline elapsed, aborting outstanding fetches"
            );
            tasks.abort_all();
            failed += pending;
        }

        // Aggregated.
        self.snapshot.apply_cycle(&observations).await;

        let report = CycleReport {
            up: true,
            listed,
            updated: observations.len(),
            failed,
        };
        info!(
            listed = report.listed,
            updated = report.updated,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape cycle complete"
        );
        report
    }
}

/// Labels come from the listed record, values from the detail record.
fn observe(listed: &VpnConnection, detail: &VpnConnection) -> Observation {
    Observation {
        key: LabelKey::new(&listed.name, &listed.resource_group),
        connected: detail.properties.status.is_connected(),
        ingress_bytes: detail.properties.ingress_bytes_transferred,
        egress_bytes: detail.properties.egress_bytes_transferred,
    }
}
