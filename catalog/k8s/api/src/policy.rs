pub mod ingress_backend;

pub use self::ingress_backend::{
    BackendPort, IngressBackend, IngressBackendSpec, IngressBackendTarget, IngressSource,
    IngressSourceKind,
};
