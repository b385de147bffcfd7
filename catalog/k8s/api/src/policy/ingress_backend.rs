/// Exposes mesh services to clients outside of the mesh, such as ingress controllers.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    kube::CustomResource,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
#[kube(
    group = "policy.openservicemesh.io",
    version = "v1alpha1",
    kind = "IngressBackend",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackendSpec {
    /// Services in the `IngressBackend`'s namespace that accept ingress traffic.
    #[serde(default)]
    pub backends: Vec<IngressBackendTarget>,

    /// Clients permitted to send ingress traffic to the backends.
    #[serde(default)]
    pub sources: Vec<IngressSource>,
}

#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub struct IngressBackendTarget {
    pub name: String,
    pub port: BackendPort,
}

#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub struct BackendPort {
    pub number: i32,
    pub protocol: String,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct IngressSource {
    pub kind: IngressSourceKind,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub enum IngressSourceKind {
    Service,
    #[serde(rename = "IPRange")]
    IpRange,
    AuthenticatedPrincipal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sources() {
        let spec: IngressBackendSpec = serde_json::from_value(serde_json::json!({
            "backends": [{
                "name": "bookstore",
                "port": { "number": 14001, "protocol": "http" },
            }],
            "sources": [
                { "kind": "Service", "name": "ingress-nginx", "namespace": "ingress" },
                { "kind": "IPRange", "name": "10.0.0.0/8" },
            ],
        }))
        .expect("spec must deserialize");

        assert_eq!(spec.backends[0].port.number, 14001);
        assert_eq!(spec.sources[0].kind, IngressSourceKind::Service);
        assert_eq!(spec.sources[1].kind, IngressSourceKind::IpRange);
        assert_eq!(spec.sources[1].namespace, None);
    }
}
