use crate::{
    ingress,
    routes::{self, RouteIndex},
    split, traffic_target, Providers,
};
use ahash::AHashSet as HashSet;
use anyhow::{Context, Result};
use mesh_catalog_core::{
    Certificate, CertificateLookup, CommonName, IngressMonitor, MeshService, MeshSpec,
    MeshSpecSnapshot, RoutePolicyMap, ServiceIdentity, TrafficTarget, WeightedCluster,
};
use parking_lot::RwLock;
use std::{fmt, sync::Arc};

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// The trust domain of workload certificates' common names.
    pub trust_domain: String,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("no certificate issued for {0}")]
pub struct CertificateNotFound(pub CommonName);

/// Resolves cluster and policy state into per-service traffic policies.
///
/// The catalog only reads the snapshots published by its collaborators. Each operation captures the
/// snapshots and provider views it needs once, so that its result is computed from a single,
/// consistent view even as new snapshots are published concurrently.
pub struct MeshCatalog {
    config: CatalogConfig,
    mesh_spec: Arc<dyn MeshSpec>,
    providers: Providers,
    certificates: Arc<dyn CertificateLookup>,
    ingress: Arc<dyn IngressMonitor>,

    /// The route index of the most recently resolved mesh spec snapshot.
    routes: RwLock<Option<MemoizedRoutes>>,
}

struct MemoizedRoutes {
    snapshot: Arc<MeshSpecSnapshot>,
    index: Arc<RouteIndex>,
}

// === impl CatalogConfig ===

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            trust_domain: "cluster.local".to_string(),
        }
    }
}

// === impl MeshCatalog ===

impl MeshCatalog {
    pub fn new(
        config: CatalogConfig,
        mesh_spec: Arc<dyn MeshSpec>,
        providers: Providers,
        certificates: Arc<dyn CertificateLookup>,
        ingress: Arc<dyn IngressMonitor>,
    ) -> Self {
        Self {
            config,
            mesh_spec,
            providers,
            certificates,
            ingress,
            routes: RwLock::new(None),
        }
    }

    /// Lists the traffic policies that authorize access to `destination`.
    ///
    /// Policies derived from `TrafficTarget`s are listed first, followed by policies derived from
    /// `IngressBackend`s. Repeated calls against unchanged snapshots return equal results.
    pub fn list_traffic_policies(&self, destination: &MeshService) -> Result<Vec<TrafficTarget>> {
        let snapshot = self
            .mesh_spec
            .snapshot()
            .with_context(|| format!("listing traffic policies for {destination}"))?;
        let ingress = self
            .ingress
            .ingress_backends()
            .with_context(|| format!("listing ingress policies for {destination}"))?;

        let providers = self.providers.capture();

        let routes = self.route_index(&snapshot);
        let mut targets =
            traffic_target::resolve(&providers, &snapshot, &routes.routes, destination).targets;
        targets.extend(ingress::resolve(&providers, &ingress, destination));
        Ok(targets)
    }

    /// Resolves the current `TrafficTarget`s that apply to `destination` against the given routes.
    pub fn traffic_policy_per_route(
        &self,
        routes: &RoutePolicyMap,
        destination: &MeshService,
    ) -> Result<Vec<TrafficTarget>> {
        let snapshot = self
            .mesh_spec
            .snapshot()
            .with_context(|| format!("listing traffic policies for {destination}"))?;
        let providers = self.providers.capture();
        Ok(traffic_target::resolve(&providers, &snapshot, routes, destination).targets)
    }

    /// Returns the route index of the current mesh spec snapshot.
    pub fn http_paths_per_route(&self) -> Result<Arc<RouteIndex>> {
        let snapshot = self.mesh_spec.snapshot().context("indexing routes")?;
        Ok(self.route_index(&snapshot))
    }

    pub fn get_weighted_clusters_for_service(
        &self,
        service: &MeshService,
    ) -> Result<Vec<WeightedCluster>> {
        let snapshot = self
            .mesh_spec
            .snapshot()
            .with_context(|| format!("listing traffic splits for {service}"))?;
        let providers = self.providers.capture();
        Ok(split::weighted_clusters(&providers, &snapshot, service))
    }

    /// Lists the identities that `TrafficTarget`s permit to reach `identity`.
    pub fn list_allowed_inbound_service_identities(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Vec<ServiceIdentity>> {
        let snapshot = self
            .mesh_spec
            .snapshot()
            .with_context(|| format!("listing inbound identities for {identity}"))?;

        let mut seen = HashSet::new();
        Ok(snapshot
            .traffic_targets
            .iter()
            .filter(|target| {
                traffic_target::subject_identity(target, &target.spec.destination).as_ref()
                    == Some(identity)
            })
            .flat_map(|target| {
                target
                    .spec
                    .sources
                    .iter()
                    .filter_map(|src| traffic_target::subject_identity(target, src))
            })
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    /// Lists the identities that `TrafficTarget`s permit `identity` to reach.
    pub fn list_allowed_outbound_service_identities(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Vec<ServiceIdentity>> {
        let snapshot = self
            .mesh_spec
            .snapshot()
            .with_context(|| format!("listing outbound identities for {identity}"))?;

        let mut seen = HashSet::new();
        Ok(snapshot
            .traffic_targets
            .iter()
            .filter(|target| {
                target.spec.sources.iter().any(|src| {
                    traffic_target::subject_identity(target, src).as_ref() == Some(identity)
                })
            })
            .filter_map(|target| {
                traffic_target::subject_identity(target, &target.spec.destination)
            })
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    pub fn list_services(&self) -> Vec<MeshService> {
        self.providers.list_services()
    }

    pub fn get_services_for_service_identity(
        &self,
        identity: &ServiceIdentity,
    ) -> Vec<MeshService> {
        self.providers.get_services_for_service_identity(identity)
    }

    pub fn list_service_identities_for_service(
        &self,
        service: &MeshService,
    ) -> Vec<ServiceIdentity> {
        self.providers.list_service_identities_for_service(service)
    }

    pub fn get_certificate_for_service_identity(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Arc<Certificate>> {
        let cn = identity.common_name(&self.config.trust_domain);
        self.certificates
            .get_certificate(&cn)
            .ok_or_else(|| CertificateNotFound(cn).into())
    }

    /// Returns the route index for `snapshot`, building it if the memoized index was built from a
    /// different snapshot. A new index is built before it replaces the memoized one, and it is only
    /// memoized while `snapshot` is still the current snapshot.
    pub(crate) fn route_index(&self, snapshot: &Arc<MeshSpecSnapshot>) -> Arc<RouteIndex> {
        if let Some(memo) = &*self.routes.read() {
            if Arc::ptr_eq(&memo.snapshot, snapshot) {
                return memo.index.clone();
            }
        }

        let index = Arc::new(routes::http_paths_per_route(&snapshot.route_groups));

        let mut memo = self.routes.write();
        if let Some(current) = &*memo {
            // Another caller indexed this snapshot first.
            if Arc::ptr_eq(&current.snapshot, snapshot) {
                return current.index.clone();
            }
        }
        let is_current = self
            .mesh_spec
            .snapshot()
            .map(|current| Arc::ptr_eq(&current, snapshot))
            .unwrap_or(false);
        if !is_current {
            tracing::debug!("not memoizing routes of a superseded snapshot");
            return index;
        }

        for defect in traffic_target::unsupported_destinations(snapshot) {
            tracing::warn!(%defect, "skipping traffic target");
        }
        *memo = Some(MemoizedRoutes {
            snapshot: snapshot.clone(),
            index: index.clone(),
        });
        index
    }
}

impl fmt::Debug for MeshCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshCatalog")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
