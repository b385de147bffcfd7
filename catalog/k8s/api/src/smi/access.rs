/// Authorizes a set of source identities to reach a destination identity on the routes named by
/// its rules.
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
    group = "access.smi-spec.io",
    version = "v1alpha3",
    kind = "TrafficTarget",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTargetSpec {
    pub destination: IdentityBindingSubject,

    #[serde(default)]
    pub sources: Vec<IdentityBindingSubject>,

    #[serde(default)]
    pub rules: Vec<TrafficTargetRule>,
}

/// Names a workload identity.
///
/// If no namespace is specified, the `TrafficTarget`'s namespace is used.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub struct IdentityBindingSubject {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub port: Option<i32>,
}

/// References match blocks in a route group.
///
/// When `matches` is empty, every match in the group is referenced.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub struct TrafficTargetRule {
    pub kind: String,
    pub name: String,

    #[serde(default)]
    pub matches: Vec<String>,
}
