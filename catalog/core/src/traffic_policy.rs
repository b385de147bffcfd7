use crate::MeshService;
use ahash::AHashMap as HashMap;
use std::{collections::BTreeMap, fmt};

/// Indexes routes by the route group that declares them and by the name of the match block within
/// that group.
pub type RoutePolicyMap = HashMap<TrafficSpecName, BTreeMap<TrafficSpecMatchName, Route>>;

/// Identifies a route-grouping policy object as `Kind/Namespace/Name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrafficSpecName(String);

/// Names one match block within a route-grouping policy object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrafficSpecMatchName(String);

/// A concrete HTTP match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    pub path_regex: String,

    /// Allowed methods, in the order they were declared.
    pub methods: Vec<String>,

    /// Required header values, keyed by header name. Empty when no headers are constrained.
    pub headers: BTreeMap<String, String>,
}

/// A resolved authorization: `source` may reach `destination` on `route`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrafficTarget {
    /// The name of the policy object this record was expanded from.
    pub name: String,
    pub destination: TrafficResource,
    pub source: TrafficResource,
    pub route: Route,
}

/// One side of a [`TrafficTarget`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TrafficResource {
    pub service_account: String,
    pub namespace: String,
    pub service: MeshService,
}

// === impl TrafficSpecName ===

impl TrafficSpecName {
    pub fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self(format!("{kind}/{namespace}/{name}"))
    }
}

impl fmt::Display for TrafficSpecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for TrafficSpecName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// === impl TrafficSpecMatchName ===

impl From<String> for TrafficSpecMatchName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for TrafficSpecMatchName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for TrafficSpecMatchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// === impl Route ===

impl Route {
    /// Matches all paths and methods.
    pub fn wildcard() -> Self {
        Self {
            path_regex: ".*".to_string(),
            methods: vec!["*".to_string()],
            headers: BTreeMap::new(),
        }
    }
}
