use std::fmt;

/// A service (Kubernetes or otherwise) within the service mesh.
///
/// The naming methods on this type are used as lookup keys by both the catalog and the proxy
/// configuration generator, so their formats must never change independently of one another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshService {
    /// The namespace of the service, e.g. the Kubernetes namespace.
    pub namespace: String,

    pub name: String,

    /// The port clients use to reach the service.
    pub port: u16,

    /// The port the application accepts connections on. This may differ from `port`.
    pub target_port: u16,

    /// The application protocol served on the port.
    pub protocol: String,

    /// Names the provider object this service was created from (e.g. a Kubernetes Service).
    pub provider_key: String,
}

/// The name of a proxy cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterName(pub String);

/// A cluster and its relative weight within a traffic split.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WeightedCluster {
    pub cluster_name: ClusterName,
    pub weight: u32,
}

// === impl MeshService ===

impl MeshService {
    /// The key with which the backing object is looked up within its provider.
    pub fn namespaced_key(&self) -> String {
        format!("{}/{}", self.namespace, self.provider_key)
    }

    pub fn envoy_cluster_name(&self) -> ClusterName {
        ClusterName(format!(
            "{}/{}|{}",
            self.namespace, self.name, self.target_port
        ))
    }

    pub fn envoy_local_cluster_name(&self) -> ClusterName {
        ClusterName(format!(
            "{}/{}|{}|local",
            self.namespace, self.name, self.target_port
        ))
    }

    pub fn fqdn(&self) -> String {
        format!("{}.{}.svc.cluster.local", self.name, self.namespace)
    }

    pub fn outbound_traffic_match_name(&self) -> String {
        format!("outbound_{}_{}_{}", self, self.port, self.protocol)
    }

    pub fn inbound_traffic_match_name(&self) -> String {
        format!("inbound_{}_{}_{}", self, self.target_port, self.protocol)
    }

    pub fn ingress_traffic_match_name(&self) -> String {
        format!(
            "ingress_{}/{}_{}_{}",
            self.namespace, self.name, self.target_port, self.protocol
        )
    }
}

impl fmt::Display for MeshService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl ClusterName ===

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for ClusterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc() -> MeshService {
        MeshService {
            namespace: "ns".to_string(),
            name: "svc".to_string(),
            port: 80,
            target_port: 8080,
            protocol: "http".to_string(),
            provider_key: "svc-key".to_string(),
        }
    }

    #[test]
    fn cluster_names() {
        let svc = svc();
        assert_eq!(svc.envoy_cluster_name().to_string(), "ns/svc|8080");
        assert_eq!(svc.envoy_local_cluster_name().as_ref(), "ns/svc|8080|local");
    }

    #[test]
    fn service_names() {
        let svc = svc();
        assert_eq!(svc.to_string(), "ns/svc");
        assert_eq!(svc.namespaced_key(), "ns/svc-key");
        assert_eq!(svc.fqdn(), "svc.ns.svc.cluster.local");
    }

    #[test]
    fn traffic_match_names() {
        let svc = svc();
        assert_eq!(svc.outbound_traffic_match_name(), "outbound_ns/svc_80_http");
        assert_eq!(svc.inbound_traffic_match_name(), "inbound_ns/svc_8080_http");
        assert_eq!(svc.ingress_traffic_match_name(), "ingress_ns/svc_8080_http");
    }
}
