use crate::ResourceRef;
use anyhow::Result;
use mesh_catalog_core::{
    IngressMonitor, IngressSnapshot, MeshSpec, MeshSpecSnapshot, SnapshotUnavailable,
};
use mesh_catalog_k8s_api::{policy::IngressBackend, smi};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::watch;

pub type SharedIndex = Arc<RwLock<Index>>;

/// Holds the policy resources in the cluster.
///
/// Owned and updated by the tasks that process watch events. Each update publishes a new snapshot
/// to all [`Reader`]s.
#[derive(Debug)]
pub struct Index {
    route_groups: BTreeMap<ResourceRef, Arc<smi::HttpRouteGroup>>,
    traffic_targets: BTreeMap<ResourceRef, Arc<smi::TrafficTarget>>,
    traffic_splits: BTreeMap<ResourceRef, Arc<smi::TrafficSplit>>,
    ingress_backends: BTreeMap<ResourceRef, Arc<IngressBackend>>,

    spec_tx: watch::Sender<Arc<MeshSpecSnapshot>>,
    ingress_tx: watch::Sender<Arc<IngressSnapshot>>,
}

/// A cloneable handle to the snapshots published by an [`Index`].
#[derive(Clone, Debug)]
pub struct Reader {
    spec_rx: watch::Receiver<Arc<MeshSpecSnapshot>>,
    ingress_rx: watch::Receiver<Arc<IngressSnapshot>>,
}

/// The number of resources held by the index, by kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Sizes {
    pub route_groups: usize,
    pub traffic_targets: usize,
    pub traffic_splits: usize,
    pub ingress_backends: usize,
}

// === impl Index ===

impl Index {
    pub fn shared() -> SharedIndex {
        let (spec_tx, _) = watch::channel(Default::default());
        let (ingress_tx, _) = watch::channel(Default::default());
        Arc::new(RwLock::new(Self {
            route_groups: BTreeMap::new(),
            traffic_targets: BTreeMap::new(),
            traffic_splits: BTreeMap::new(),
            ingress_backends: BTreeMap::new(),
            spec_tx,
            ingress_tx,
        }))
    }

    pub fn reader(&self) -> Reader {
        Reader {
            spec_rx: self.spec_tx.subscribe(),
            ingress_rx: self.ingress_tx.subscribe(),
        }
    }

    pub(crate) fn sizes(&self) -> Sizes {
        Sizes {
            route_groups: self.route_groups.len(),
            traffic_targets: self.traffic_targets.len(),
            traffic_splits: self.traffic_splits.len(),
            ingress_backends: self.ingress_backends.len(),
        }
    }

    fn publish_spec(&self) {
        let snapshot = MeshSpecSnapshot {
            route_groups: self.route_groups.values().cloned().collect(),
            traffic_targets: self.traffic_targets.values().cloned().collect(),
            traffic_splits: self.traffic_splits.values().cloned().collect(),
        };
        tracing::debug!(
            route_groups = snapshot.route_groups.len(),
            traffic_targets = snapshot.traffic_targets.len(),
            traffic_splits = snapshot.traffic_splits.len(),
            "publishing mesh spec snapshot"
        );
        self.spec_tx.send_replace(Arc::new(snapshot));
    }

    fn publish_ingress(&self) {
        let snapshot = IngressSnapshot {
            backends: self.ingress_backends.values().cloned().collect(),
        };
        tracing::debug!(
            ingress_backends = snapshot.backends.len(),
            "publishing ingress snapshot"
        );
        self.ingress_tx.send_replace(Arc::new(snapshot));
    }
}

/// Inserts `resource` into `index`, returning false if the resource is not namespaced.
fn insert<T: mesh_catalog_k8s_api::Resource>(
    index: &mut BTreeMap<ResourceRef, Arc<T>>,
    resource: T,
) -> bool {
    match ResourceRef::of(&resource) {
        Some(key) => {
            tracing::debug!(namespace = %key.namespace, name = %key.name, "indexing");
            index.insert(key, Arc::new(resource));
            true
        }
        None => {
            tracing::warn!("ignoring resource without a namespace");
            false
        }
    }
}

impl kubert::index::IndexNamespacedResource<smi::HttpRouteGroup> for Index {
    fn apply(&mut self, group: smi::HttpRouteGroup) {
        if insert(&mut self.route_groups, group) {
            self.publish_spec();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .route_groups
            .remove(&ResourceRef::new(namespace, name))
            .is_some()
        {
            self.publish_spec();
        }
    }
}

impl kubert::index::IndexNamespacedResource<smi::TrafficTarget> for Index {
    fn apply(&mut self, target: smi::TrafficTarget) {
        if insert(&mut self.traffic_targets, target) {
            self.publish_spec();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .traffic_targets
            .remove(&ResourceRef::new(namespace, name))
            .is_some()
        {
            self.publish_spec();
        }
    }
}

impl kubert::index::IndexNamespacedResource<smi::TrafficSplit> for Index {
    fn apply(&mut self, split: smi::TrafficSplit) {
        if insert(&mut self.traffic_splits, split) {
            self.publish_spec();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .traffic_splits
            .remove(&ResourceRef::new(namespace, name))
            .is_some()
        {
            self.publish_spec();
        }
    }
}

impl kubert::index::IndexNamespacedResource<IngressBackend> for Index {
    fn apply(&mut self, backend: IngressBackend) {
        if insert(&mut self.ingress_backends, backend) {
            self.publish_ingress();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .ingress_backends
            .remove(&ResourceRef::new(namespace, name))
            .is_some()
        {
            self.publish_ingress();
        }
    }
}

// === impl Reader ===

impl Reader {
    /// Completes when a new mesh spec snapshot is published. Fails once the index is dropped.
    pub async fn changed(&mut self) -> Result<()> {
        self.spec_rx.changed().await?;
        Ok(())
    }
}

impl MeshSpec for Reader {
    fn snapshot(&self) -> Result<Arc<MeshSpecSnapshot>> {
        // The channel only reports an error once the index has been dropped.
        if self.spec_rx.has_changed().is_err() {
            return Err(SnapshotUnavailable("mesh spec").into());
        }
        Ok(self.spec_rx.borrow().clone())
    }
}

impl IngressMonitor for Reader {
    fn ingress_backends(&self) -> Result<Arc<IngressSnapshot>> {
        if self.ingress_rx.has_changed().is_err() {
            return Err(SnapshotUnavailable("ingress").into());
        }
        Ok(self.ingress_rx.borrow().clone())
    }
}
