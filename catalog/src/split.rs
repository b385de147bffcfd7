//! Resolves `TrafficSplit` resources into weighted clusters.

use crate::Providers;
use mesh_catalog_core::{MeshService, MeshSpecSnapshot, WeightedCluster};
use mesh_catalog_k8s_api::ResourceExt;

/// Returns the weighted backend clusters of every traffic split rooted at `service`.
///
/// Backends are resolved to services in the root service's namespace that expose the same port.
/// Backends with negative weights or without a matching service are skipped.
pub fn weighted_clusters(
    providers: &Providers,
    snapshot: &MeshSpecSnapshot,
    service: &MeshService,
) -> Vec<WeightedCluster> {
    let splits = snapshot
        .traffic_splits
        .iter()
        .filter(|split| {
            split.namespace().as_deref() == Some(service.namespace.as_str())
                && split.spec.service == service.name
        })
        .collect::<Vec<_>>();
    if splits.is_empty() {
        return vec![];
    }

    let services = providers.list_services();
    let mut clusters = Vec::new();
    for split in splits {
        let split_name = split.name_any();
        for backend in &split.spec.backends {
            let weight = match u32::try_from(backend.weight) {
                Ok(weight) => weight,
                Err(_) => {
                    tracing::warn!(
                        split = %split_name,
                        backend = %backend.service,
                        weight = backend.weight,
                        "skipping backend with a negative weight"
                    );
                    continue;
                }
            };

            let before = clusters.len();
            clusters.extend(
                services
                    .iter()
                    .filter(|svc| {
                        svc.namespace == service.namespace
                            && svc.name == backend.service
                            && svc.port == service.port
                    })
                    .map(|svc| WeightedCluster {
                        cluster_name: svc.envoy_cluster_name(),
                        weight,
                    }),
            );
            if clusters.len() == before {
                tracing::warn!(
                    split = %split_name,
                    backend = %backend.service,
                    port = service.port,
                    "skipping backend without a matching service"
                );
            }
        }
    }

    clusters
}
