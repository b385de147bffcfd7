//! Bindings for the Service Mesh Interface (SMI) resources consumed by the catalog.

pub mod access;
pub mod specs;
pub mod split;

pub use self::{
    access::{IdentityBindingSubject, TrafficTarget, TrafficTargetRule, TrafficTargetSpec},
    specs::{HttpMatch, HttpRouteGroup, HttpRouteGroupSpec},
    split::{TrafficSplit, TrafficSplitBackend, TrafficSplitSpec},
};

/// The subject kind naming a `ServiceAccount`.
pub const SERVICE_ACCOUNT_KIND: &str = "ServiceAccount";
