use crate::{
    catalog::{CatalogConfig, MeshCatalog},
    provider::Providers,
};
use anyhow::{bail, Result};
use clap::Parser;
use kube::{runtime::watcher, Client, Resource};
use mesh_catalog_core::{certificate::CertificateCache, MeshSpec, Provider};
use mesh_catalog_k8s_api::{self as k8s, policy::IngressBackend, smi};
use mesh_catalog_k8s_index::{mesh_spec, metrics, provider};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "mesh-catalog", about = "Resolves service mesh traffic policies")]
pub struct Args {
    #[clap(
        long,
        default_value = "mesh_catalog=info,warn",
        env = "MESH_CATALOG_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The trust domain of workload certificates.
    #[clap(long, default_value = "cluster.local")]
    trust_domain: String,

    /// Identifies the Kubernetes provider in logs.
    #[clap(long, default_value = "kubernetes")]
    provider_id: String,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            trust_domain,
            provider_id,
        } = self;

        let mesh_spec_index = mesh_spec::Index::shared();
        let provider_index = provider::Index::shared();

        let mut prom = <Registry>::default();
        metrics::register(
            prom.sub_registry_with_prefix("mesh_catalog_index"),
            mesh_spec_index.clone(),
            provider_index.clone(),
        );

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        // Spawn resource watches.

        let services = runtime.watch_all::<k8s::Service>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(provider_index.clone(), services)
                .instrument(info_span!("services")),
        );

        let pods = runtime.watch_all::<k8s::Pod>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(provider_index.clone(), pods).instrument(info_span!("pods")),
        );

        if api_resource_exists::<smi::HttpRouteGroup>(&runtime.client()).await {
            let route_groups =
                runtime.watch_all::<smi::HttpRouteGroup>(watcher::Config::default());
            tokio::spawn(
                kubert::index::namespaced(mesh_spec_index.clone(), route_groups)
                    .instrument(info_span!("httproutegroups.specs.smi-spec.io")),
            );
        } else {
            tracing::warn!(
                "httproutegroups.specs.smi-spec.io resource kind not found, skipping watches"
            );
        }

        if api_resource_exists::<smi::TrafficTarget>(&runtime.client()).await {
            let traffic_targets =
                runtime.watch_all::<smi::TrafficTarget>(watcher::Config::default());
            tokio::spawn(
                kubert::index::namespaced(mesh_spec_index.clone(), traffic_targets)
                    .instrument(info_span!("traffictargets.access.smi-spec.io")),
            );
        } else {
            tracing::warn!(
                "traffictargets.access.smi-spec.io resource kind not found, skipping watches"
            );
        }

        if api_resource_exists::<smi::TrafficSplit>(&runtime.client()).await {
            let traffic_splits =
                runtime.watch_all::<smi::TrafficSplit>(watcher::Config::default());
            tokio::spawn(
                kubert::index::namespaced(mesh_spec_index.clone(), traffic_splits)
                    .instrument(info_span!("trafficsplits.split.smi-spec.io")),
            );
        } else {
            tracing::warn!(
                "trafficsplits.split.smi-spec.io resource kind not found, skipping watches"
            );
        }

        if api_resource_exists::<IngressBackend>(&runtime.client()).await {
            let ingress_backends = runtime.watch_all::<IngressBackend>(watcher::Config::default());
            tokio::spawn(
                kubert::index::namespaced(mesh_spec_index.clone(), ingress_backends)
                    .instrument(info_span!("ingressbackends.policy.openservicemesh.io")),
            );
        } else {
            tracing::warn!(
                "ingressbackends.policy.openservicemesh.io resource kind not found, skipping watches"
            );
        }

        let reader = mesh_spec_index.read().reader();
        let kubernetes: Arc<dyn Provider> = Arc::new(provider_index.read().reader(provider_id));
        let providers = Providers::new(vec![kubernetes])?;
        let catalog = Arc::new(MeshCatalog::new(
            CatalogConfig { trust_domain },
            Arc::new(reader.clone()),
            providers,
            Arc::new(CertificateCache::default()),
            Arc::new(reader.clone()),
        ));
        tokio::spawn(report(catalog, reader).instrument(info_span!("report")));

        // Block the main thread on the shutdown signal. Once it fires, wait for the background
        // tasks to complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

/// Logs a summary of the resolved traffic policies each time a new mesh spec snapshot is published.
async fn report(catalog: Arc<MeshCatalog>, mut reader: mesh_spec::Reader) {
    while reader.changed().await.is_ok() {
        let routes = match catalog.http_paths_per_route() {
            Ok(routes) => routes,
            Err(error) => {
                tracing::warn!(%error, "failed to index routes");
                continue;
            }
        };
        let traffic_splits = reader
            .snapshot()
            .map(|snapshot| snapshot.traffic_splits.len())
            .unwrap_or_default();

        let services = catalog.list_services();
        let mut policies = 0;
        for service in &services {
            match catalog.list_traffic_policies(service) {
                Ok(targets) => policies += targets.len(),
                Err(error) => tracing::warn!(%service, %error, "failed to list traffic policies"),
            }
        }

        tracing::info!(
            route_groups = routes.routes.len(),
            route_defects = routes.defects.len(),
            traffic_splits,
            services = services.len(),
            policies,
            "resolved traffic policies"
        );
    }
    tracing::debug!("mesh spec index closed");
}

async fn api_resource_exists<T>(client: &Client) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    client
        .list_api_group_resources(&T::api_version(&dt))
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.kind == T::kind(&dt))
}
