use crate::certificate::CommonName;
use std::fmt;

/// A workload identity, i.e. a Kubernetes `ServiceAccount`.
///
/// Identities are the subjects of authorization policies and the common names of the certificates
/// issued to workloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceIdentity {
    pub namespace: String,
    pub name: String,
}

// === impl ServiceIdentity ===

impl ServiceIdentity {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn common_name(&self, trust_domain: &str) -> CommonName {
        CommonName(format!("{}.{}.{}", self.name, self.namespace, trust_domain))
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_name() {
        let id = ServiceIdentity::new("default", "bookbuyer");
        assert_eq!(
            id.common_name("cluster.local").to_string(),
            "bookbuyer.default.cluster.local"
        );
        assert_eq!(id.to_string(), "default/bookbuyer");
    }
}
