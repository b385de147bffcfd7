use anyhow::Result;
use mesh_catalog_k8s_api::smi;
use std::sync::Arc;

/// Indicates that the watch layer no longer publishes snapshots.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{0} snapshot is unavailable")]
pub struct SnapshotUnavailable(pub &'static str);

/// An immutable view of the policy resources in the cluster.
///
/// Each list is ordered by namespace and then by name. Resources are shared with the index that
/// published them and with later snapshots that still hold them.
#[derive(Clone, Debug, Default)]
pub struct MeshSpecSnapshot {
    pub route_groups: Vec<Arc<smi::HttpRouteGroup>>,
    pub traffic_targets: Vec<Arc<smi::TrafficTarget>>,
    pub traffic_splits: Vec<Arc<smi::TrafficSplit>>,
}

/// Provides read-only access to the current policy resources.
pub trait MeshSpec: Send + Sync {
    /// Captures the current snapshot. The returned value is never mutated; updates are published as
    /// new snapshots.
    fn snapshot(&self) -> Result<Arc<MeshSpecSnapshot>>;
}
