//! Folds `IngressBackend` resources into traffic policies.
//!
//! An ingress backend permits its sources to reach the backend services on any route. Only
//! `Service` sources can be expressed as traffic policy subjects; other source kinds are enforced
//! by the proxy configuration directly.

use crate::Providers;
use mesh_catalog_core::{IngressSnapshot, MeshService, Route, TrafficResource, TrafficTarget};
use mesh_catalog_k8s_api::{
    policy::{IngressBackend, IngressSourceKind},
    ResourceExt,
};

/// Resolves the ingress backends in `snapshot` that expose `destination`.
pub fn resolve(
    providers: &Providers,
    snapshot: &IngressSnapshot,
    destination: &MeshService,
) -> Vec<TrafficTarget> {
    let backends = snapshot
        .backends
        .iter()
        .filter(|backend| exposes(backend, destination))
        .collect::<Vec<_>>();
    if backends.is_empty() {
        return vec![];
    }

    let destinations = providers
        .list_service_identities_for_service(destination)
        .into_iter()
        .map(|id| TrafficResource {
            service_account: id.name,
            namespace: id.namespace,
            service: destination.clone(),
        })
        .collect::<Vec<_>>();
    if destinations.is_empty() {
        tracing::debug!(%destination, "ingress backend service has no identities");
        return vec![];
    }

    let services = providers.list_services();
    let mut targets = Vec::new();
    for backend in backends {
        let ns = backend.namespace().unwrap_or_default();
        let name = format!("ingress/{}/{}", ns, backend.name_any());

        for source in &backend.spec.sources {
            if source.kind != IngressSourceKind::Service {
                tracing::debug!(
                    ingress = %name,
                    source = %source.name,
                    kind = ?source.kind,
                    "skipping source without a service"
                );
                continue;
            }

            let source_ns = source.namespace.as_deref().unwrap_or(&ns);
            for service in services
                .iter()
                .filter(|svc| svc.namespace == source_ns && svc.name == source.name)
            {
                for id in providers.list_service_identities_for_service(service) {
                    let source = TrafficResource {
                        service_account: id.name,
                        namespace: id.namespace,
                        service: service.clone(),
                    };
                    targets.extend(destinations.iter().map(|dst| TrafficTarget {
                        name: name.clone(),
                        destination: dst.clone(),
                        source: source.clone(),
                        route: Route::wildcard(),
                    }));
                }
            }
        }
    }

    targets
}

fn exposes(backend: &IngressBackend, destination: &MeshService) -> bool {
    backend.namespace().as_deref() == Some(destination.namespace.as_str())
        && backend.spec.backends.iter().any(|b| {
            b.name == destination.name && b.port.number == i32::from(destination.target_port)
        })
}
