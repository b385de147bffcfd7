use anyhow::Result;
use mesh_catalog_k8s_api::policy::IngressBackend;
use std::sync::Arc;

/// An immutable view of the ingress backend resources in the cluster, ordered by namespace and
/// then by name.
#[derive(Clone, Debug, Default)]
pub struct IngressSnapshot {
    pub backends: Vec<Arc<IngressBackend>>,
}

/// Supplies ingress-originated backend rules.
pub trait IngressMonitor: Send + Sync {
    fn ingress_backends(&self) -> Result<Arc<IngressSnapshot>>;
}
