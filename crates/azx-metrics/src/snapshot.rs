//! Metrics snapshot — the process-wide set of VPN connection series.
//!
//! Written only by the scrape coordinator and read by the exposition
//! handler. Both sides take the same lock, and a whole cycle's worth of
//! observations is applied under one acquisition, so readers never see a
//! half-applied cycle.
//!
//! Series are never evicted: a connection that disappears from the list
//! keeps its last values until the process restarts.

use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::debug;

/// Label pair identifying one connection's series. Both parts are lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelKey {
    pub name: String,
    pub group: String,
}

impl LabelKey {
    pub fn new(name: &str, group: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            group: group.to_lowercase(),
        }
    }
}

/// Current values of one connection's series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VpnSeries {
    /// 1 when connected, 0 otherwise.
    pub status: f64,
    pub ingress_bytes: f64,
    pub egress_bytes: f64,
}

/// What one successful detail fetch contributes to the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub key: LabelKey,
    pub connected: bool,
    pub ingress_bytes: f64,
    pub egress_bytes: f64,
}

/// A copy of the snapshot contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotData {
    /// 1 if the last cycle's list call succeeded.
    pub up: f64,
    pub series: BTreeMap<LabelKey, VpnSeries>,
}

impl SnapshotData {
    /// Set the status gauge and add to the byte counters.
    fn record(&mut self, obs: &Observation) {
        let series = self.series.entry(obs.key.clone()).or_default();
        series.status = if obs.connected { 1.0 } else { 0.0 };
        series.ingress_bytes += obs.ingress_bytes;
        series.egress_bytes += obs.egress_bytes;
    }
}

/// Lock-guarded snapshot shared by the coordinator and the exposition handler.
#[derive(Debug, Default)]
pub struct MetricsSnapshot {
    inner: Mutex<SnapshotData>,
}

impl MetricsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the outcome of a completed cycle whose list call succeeded.
    pub async fn apply_cycle(&self, observations: &[Observation]) {
        let mut data = self.inner.lock().await;
        data.up = 1.0;
        for obs in observations {
            data.record(obs);
        }
        debug!(updated = observations.len(), total = data.series.len(), "snapshot updated");
    }

    /// Mark the last cycle as failed. Series keep their previous values.
    pub async fn mark_down(&self) {
        self.inner.lock().await.up = 0.0;
    }

    /// Copy out the current contents.
    pub async fn read(&self) -> SnapshotData {
        self.inner.lock().await.clone()
    }
}
