#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod certificate;
mod identity;
pub mod ingress;
pub mod mesh_spec;
mod provider;
mod service;
pub mod traffic_policy;

pub use self::{
    certificate::{Certificate, CertificateLookup, CommonName},
    identity::ServiceIdentity,
    ingress::{IngressMonitor, IngressSnapshot},
    mesh_spec::{MeshSpec, MeshSpecSnapshot, SnapshotUnavailable},
    provider::Provider,
    service::{ClusterName, MeshService, WeightedCluster},
    traffic_policy::{
        Route, RoutePolicyMap, TrafficResource, TrafficSpecMatchName, TrafficSpecName,
        TrafficTarget,
    },
};
pub use mesh_catalog_k8s_api as k8s;
