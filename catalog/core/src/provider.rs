use crate::{MeshService, ServiceIdentity};
use anyhow::Result;
use std::sync::Arc;

/// Models a compute provider (e.g. Kubernetes) that maps its native objects onto mesh services
/// and the identities backing them.
///
/// Implementations must answer each call from a single, consistent view of their data.
pub trait Provider: Send + Sync {
    /// Captures the provider's current view. The returned provider answers every call from that
    /// view, even after the provider's data is refreshed.
    fn capture(&self) -> Result<Arc<dyn Provider>>;

    /// Lists the services backed by workloads running as the given identity.
    fn get_services_for_service_identity(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Vec<MeshService>>;

    /// Lists all services known to the provider.
    fn list_services(&self) -> Result<Vec<MeshService>>;

    /// Lists the identities of the workloads backing the given service.
    fn list_service_identities_for_service(
        &self,
        service: &MeshService,
    ) -> Result<Vec<ServiceIdentity>>;

    /// Identifies the provider in diagnostics.
    fn id(&self) -> &str;
}
