//! Mesh catalog indexes
//!
//! The indexes in this crate consume Kubernetes watch events (via `kubert::index`) and publish
//! immutable snapshots for the catalog to resolve against:
//!
//! - The [`mesh_spec`] index holds `HTTPRouteGroup`, `TrafficTarget`, `TrafficSplit`, and
//!   `IngressBackend` resources.
//! - The [`provider`] index holds `Service` and `Pod` resources and maps them onto mesh services
//!   and the service accounts that back them.
//!
//! Each index is owned by the tasks that process its watch events. Every update rebuilds a new
//! snapshot and publishes it on a `tokio::sync::watch` channel, so a reader that has captured a
//! snapshot never observes a partially-applied update.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod mesh_spec;
pub mod metrics;
pub mod provider;


use mesh_catalog_k8s_api::ResourceExt;

/// Identifies a namespaced resource. Ordering by namespace and then by name fixes the order of
/// published snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ResourceRef {
    namespace: String,
    name: String,
}

// === impl ResourceRef ===

impl ResourceRef {
    fn new(namespace: String, name: String) -> Self {
        Self { namespace, name }
    }

    /// Returns `None` for cluster-scoped resources, which the indexes ignore.
    fn of<T: ResourceExt>(resource: &T) -> Option<Self> {
        let namespace = resource.namespace()?;
        Some(Self::new(namespace, resource.name_any()))
    }
}
