//! Resolves Kubernetes services and SMI policy resources into the traffic policies, routes, and
//! weighted clusters used to configure a service mesh's proxies.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod catalog;
pub mod ingress;
mod provider;
pub mod routes;
pub mod split;
pub mod traffic_target;


pub use self::{
    args::Args,
    catalog::{CatalogConfig, CertificateNotFound, MeshCatalog},
    provider::Providers,
    routes::{RouteDefect, RouteIndex},
    traffic_target::ResolveDefect,
};
pub use mesh_catalog_core as core;
pub use mesh_catalog_k8s_api as k8s;
pub use mesh_catalog_k8s_index::{mesh_spec, metrics};
