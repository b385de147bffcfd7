//! Aggregates any number of compute providers into provider-agnostic listings.
//!
//! A provider that fails to answer is logged and skipped; the remaining providers' results are
//! still returned.

use ahash::AHashSet as HashSet;
use anyhow::{ensure, Result};
use mesh_catalog_core::{MeshService, Provider, ServiceIdentity};
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct Providers(Arc<[Arc<dyn Provider>]>);

// === impl Providers ===

impl Providers {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Result<Self> {
        ensure!(!providers.is_empty(), "at least one provider is required");
        Ok(Self(providers.into()))
    }

    /// Captures the current view of every provider. The returned listings do not observe
    /// provider refreshes. Providers that cannot be captured are logged and left out.
    pub fn capture(&self) -> Self {
        let captured = self
            .0
            .iter()
            .filter_map(|provider| match provider.capture() {
                Ok(view) => Some(view),
                Err(error) => {
                    tracing::warn!(provider = %provider.id(), %error, "failed to capture provider");
                    None
                }
            })
            .collect::<Vec<_>>();
        Self(captured.into())
    }

    /// Lists the services of all providers. Services that share a namespace, name, and target port
    /// are only listed once, as reported by the first provider that lists them.
    pub fn list_services(&self) -> Vec<MeshService> {
        dedup_services(self.0.iter().flat_map(|provider| {
            provider.list_services().unwrap_or_else(|error| {
                tracing::warn!(provider = %provider.id(), %error, "failed to list services");
                vec![]
            })
        }))
    }

    pub fn get_services_for_service_identity(
        &self,
        identity: &ServiceIdentity,
    ) -> Vec<MeshService> {
        dedup_services(self.0.iter().flat_map(|provider| {
            provider
                .get_services_for_service_identity(identity)
                .unwrap_or_else(|error| {
                    tracing::warn!(
                        provider = %provider.id(),
                        %identity,
                        %error,
                        "failed to get services for service identity"
                    );
                    vec![]
                })
        }))
    }

    pub fn list_service_identities_for_service(
        &self,
        service: &MeshService,
    ) -> Vec<ServiceIdentity> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .flat_map(|provider| {
                provider
                    .list_service_identities_for_service(service)
                    .unwrap_or_else(|error| {
                        tracing::warn!(
                            provider = %provider.id(),
                            %service,
                            %error,
                            "failed to list service identities for service"
                        );
                        vec![]
                    })
            })
            .filter(|identity| seen.insert(identity.clone()))
            .collect()
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|provider| provider.id()))
            .finish()
    }
}

fn dedup_services(services: impl IntoIterator<Item = MeshService>) -> Vec<MeshService> {
    let mut seen = HashSet::new();
    services
        .into_iter()
        .filter(|svc| seen.insert((svc.namespace.clone(), svc.name.clone(), svc.target_port)))
        .collect()
}
