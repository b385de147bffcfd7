use std::collections::BTreeMap;

/// Declares named HTTP match blocks that authorization policies may reference.
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
    group = "specs.smi-spec.io",
    version = "v1alpha4",
    kind = "HTTPRouteGroup",
    root = "HttpRouteGroup",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteGroupSpec {
    #[serde(default)]
    pub matches: Vec<HttpMatch>,
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
#[serde(rename_all = "camelCase")]
pub struct HttpMatch {
    /// Referenced by `TrafficTarget` rules.
    pub name: String,

    /// A regular expression matched against the request path.
    pub path_regex: Option<String>,

    #[serde(default)]
    pub methods: Vec<String>,

    /// Required header values, keyed by header name.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}
