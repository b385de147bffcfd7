//! A [`Provider`] backed by Kubernetes `Service` and `Pod` resources.
//!
//! Each port of a `Service` is modeled as a [`MeshService`]. The identities backing a service are
//! the service accounts of the pods its selector matches in the service's namespace. A service
//! account may back any number of services and a service may be backed by any number of service
//! accounts.

use crate::ResourceRef;
use anyhow::Result;
use mesh_catalog_core::{MeshService, Provider, ServiceIdentity, SnapshotUnavailable};
use mesh_catalog_k8s_api::{IntOrString, Pod, ResourceExt, Service};
use parking_lot::RwLock;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tokio::sync::watch;

pub type SharedIndex = Arc<RwLock<Index>>;

type Labels = BTreeMap<String, String>;

const DEFAULT_SERVICE_ACCOUNT: &str = "default";
const DEFAULT_APP_PROTOCOL: &str = "http";

#[derive(Debug)]
pub struct Index {
    services: BTreeMap<ResourceRef, Arc<ServiceInfo>>,
    pods: BTreeMap<ResourceRef, Arc<PodInfo>>,
    tx: watch::Sender<Arc<Snapshot>>,
}

/// Serves [`Provider`] lookups from the snapshots published by an [`Index`].
#[derive(Clone, Debug)]
pub struct Reader {
    id: Arc<str>,
    rx: watch::Receiver<Arc<Snapshot>>,
}

/// A [`Provider`] that answers from a single captured snapshot.
#[derive(Clone, Debug)]
pub struct View {
    id: Arc<str>,
    snapshot: Arc<Snapshot>,
}

#[derive(Debug, Default)]
struct Snapshot {
    services: BTreeMap<ResourceRef, Arc<ServiceInfo>>,
    pods: BTreeMap<ResourceRef, Arc<PodInfo>>,
}

/// The important parts of a `Service` resource.
#[derive(Debug, PartialEq)]
struct ServiceInfo {
    /// Services without a selector do not select any pods.
    selector: Option<Labels>,
    ports: Vec<MeshService>,
}

/// The important parts of a `Pod` resource.
#[derive(Debug, PartialEq)]
struct PodInfo {
    labels: Labels,
    service_account: String,
}

// === impl Index ===

impl Index {
    pub fn shared() -> SharedIndex {
        let (tx, _) = watch::channel(Default::default());
        Arc::new(RwLock::new(Self {
            services: BTreeMap::new(),
            pods: BTreeMap::new(),
            tx,
        }))
    }

    pub fn reader(&self, id: impl Into<Arc<str>>) -> Reader {
        Reader {
            id: id.into(),
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn services_len(&self) -> usize {
        self.services.len()
    }

    pub(crate) fn pods_len(&self) -> usize {
        self.pods.len()
    }

    fn publish(&self) {
        tracing::debug!(
            services = self.services.len(),
            pods = self.pods.len(),
            "publishing provider snapshot"
        );
        self.tx.send_replace(Arc::new(Snapshot {
            services: self.services.clone(),
            pods: self.pods.clone(),
        }));
    }
}

impl kubert::index::IndexNamespacedResource<Service> for Index {
    fn apply(&mut self, service: Service) {
        let Some(key) = ResourceRef::of(&service) else {
            tracing::warn!(service = %service.name_any(), "ignoring Service without a namespace");
            return;
        };

        let info = Arc::new(ServiceInfo::from_service(&key, &service));
        if self.services.get(&key) == Some(&info) {
            tracing::debug!(namespace = %key.namespace, name = %key.name, "no changes");
            return;
        }

        tracing::debug!(
            namespace = %key.namespace,
            name = %key.name,
            ports = info.ports.len(),
            "indexing service"
        );
        self.services.insert(key, info);
        self.publish();
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .services
            .remove(&ResourceRef::new(namespace, name))
            .is_some()
        {
            self.publish();
        }
    }
}

impl kubert::index::IndexNamespacedResource<Pod> for Index {
    fn apply(&mut self, pod: Pod) {
        let Some(key) = ResourceRef::of(&pod) else {
            tracing::warn!(pod = %pod.name_any(), "ignoring Pod without a namespace");
            return;
        };

        let info = Arc::new(PodInfo {
            labels: pod.labels().clone(),
            service_account: pod
                .spec
                .as_ref()
                .and_then(|spec| spec.service_account_name.clone())
                .filter(|sa| !sa.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT.to_string()),
        });
        if self.pods.get(&key) == Some(&info) {
            return;
        }

        self.pods.insert(key, info);
        self.publish();
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .pods
            .remove(&ResourceRef::new(namespace, name))
            .is_some()
        {
            self.publish();
        }
    }
}

// === impl ServiceInfo ===

impl ServiceInfo {
    fn from_service(key: &ResourceRef, service: &Service) -> Self {
        let spec = service.spec.as_ref();
        let selector = spec
            .and_then(|spec| spec.selector.clone())
            .filter(|selector| !selector.is_empty());

        let ports = spec
            .and_then(|spec| spec.ports.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|sp| {
                let port = match u16::try_from(sp.port) {
                    Ok(port) => port,
                    Err(_) => {
                        tracing::warn!(
                            namespace = %key.namespace,
                            name = %key.name,
                            port = sp.port,
                            "ignoring invalid service port"
                        );
                        return None;
                    }
                };

                // Named target ports are resolved per-pod, so the service port stands in for them.
                let target_port = match &sp.target_port {
                    Some(IntOrString::Int(p)) => u16::try_from(*p).unwrap_or(port),
                    Some(IntOrString::String(_)) | None => port,
                };

                Some(MeshService {
                    namespace: key.namespace.clone(),
                    name: key.name.clone(),
                    port,
                    target_port,
                    protocol: sp
                        .app_protocol
                        .clone()
                        .unwrap_or_else(|| DEFAULT_APP_PROTOCOL.to_string()),
                    provider_key: key.name.clone(),
                })
            })
            .collect();

        Self { selector, ports }
    }

    fn selects(&self, pod: &PodInfo) -> bool {
        match &self.selector {
            Some(selector) => selector.iter().all(|(k, v)| pod.labels.get(k) == Some(v)),
            None => false,
        }
    }
}

// === impl Snapshot ===

impl Snapshot {
    fn pods_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a PodInfo> + 'a {
        self.pods
            .iter()
            .filter(move |(key, _)| key.namespace == namespace)
            .map(|(_, pod)| pod.as_ref())
    }

    fn list_services(&self) -> Vec<MeshService> {
        self.services
            .values()
            .flat_map(|svc| svc.ports.iter().cloned())
            .collect()
    }

    fn services_for_identity(&self, identity: &ServiceIdentity) -> Vec<MeshService> {
        self.services
            .iter()
            .filter(|(key, _)| key.namespace == identity.namespace)
            .filter(|(_, svc)| {
                self.pods_in(&identity.namespace)
                    .any(|pod| pod.service_account == identity.name && svc.selects(pod))
            })
            .flat_map(|(_, svc)| svc.ports.iter().cloned())
            .collect()
    }

    fn identities_for_service(&self, service: &MeshService) -> Vec<ServiceIdentity> {
        let key = ResourceRef::new(service.namespace.clone(), service.provider_key.clone());
        let Some(svc) = self.services.get(&key) else {
            return vec![];
        };

        self.pods_in(&service.namespace)
            .filter(|pod| svc.selects(pod))
            .map(|pod| pod.service_account.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|sa| ServiceIdentity::new(&service.namespace, sa))
            .collect()
    }
}

// === impl Reader ===

impl Reader {
    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if self.rx.has_changed().is_err() {
            return Err(SnapshotUnavailable("kubernetes provider").into());
        }
        Ok(self.rx.borrow().clone())
    }
}

impl Provider for Reader {
    fn capture(&self) -> Result<Arc<dyn Provider>> {
        Ok(Arc::new(View {
            id: self.id.clone(),
            snapshot: self.snapshot()?,
        }))
    }

    fn get_services_for_service_identity(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Vec<MeshService>> {
        Ok(self.snapshot()?.services_for_identity(identity))
    }

    fn list_services(&self) -> Result<Vec<MeshService>> {
        Ok(self.snapshot()?.list_services())
    }

    fn list_service_identities_for_service(
        &self,
        service: &MeshService,
    ) -> Result<Vec<ServiceIdentity>> {
        Ok(self.snapshot()?.identities_for_service(service))
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// === impl View ===

impl Provider for View {
    fn capture(&self) -> Result<Arc<dyn Provider>> {
        Ok(Arc::new(self.clone()))
    }

    fn get_services_for_service_identity(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Vec<MeshService>> {
        Ok(self.snapshot.services_for_identity(identity))
    }

    fn list_services(&self) -> Result<Vec<MeshService>> {
        Ok(self.snapshot.list_services())
    }

    fn list_service_identities_for_service(
        &self,
        service: &MeshService,
    ) -> Result<Vec<ServiceIdentity>> {
        Ok(self.snapshot.identities_for_service(service))
    }

    fn id(&self) -> &str {
        &self.id
    }
}
