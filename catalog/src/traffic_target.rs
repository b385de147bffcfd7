//! Resolves `TrafficTarget` authorization policies into concrete traffic policies for a
//! destination service.
//!
//! A policy names a destination identity, any number of source identities, and rules referencing
//! route group matches. It applies to a destination service when the provider maps the destination
//! identity onto that service. Each applicable policy expands into one record per resolved source
//! service and route, ordered by policy, then by source, then by rule match.

use crate::Providers;
use mesh_catalog_core::{
    MeshService, MeshSpecSnapshot, Route, RoutePolicyMap, ServiceIdentity, TrafficResource,
    TrafficSpecMatchName, TrafficSpecName, TrafficTarget,
};
use mesh_catalog_k8s_api::{smi, Resource, ResourceExt};

/// The traffic policies resolved for a destination service.
#[derive(Debug, Default)]
pub struct Resolution {
    pub targets: Vec<TrafficTarget>,

    /// Problems encountered while resolving. Each defect only affects the subject or rule it names.
    pub defects: Vec<ResolveDefect>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveDefect {
    #[error("{target}: unsupported subject kind {kind}")]
    UnsupportedSubjectKind { target: String, kind: String },

    #[error("{target}: unsupported rule kind {kind}")]
    UnsupportedRuleKind { target: String, kind: String },

    #[error("{target}: route group {spec} not found")]
    UnknownTrafficSpec {
        target: String,
        spec: TrafficSpecName,
    },

    #[error("{target}: match {match_name} not found in {spec}")]
    UnknownTrafficSpecMatch {
        target: String,
        spec: TrafficSpecName,
        match_name: TrafficSpecMatchName,
    },
}

/// Resolves the policies in `snapshot` that apply to `destination`.
pub fn resolve(
    providers: &Providers,
    snapshot: &MeshSpecSnapshot,
    routes: &RoutePolicyMap,
    destination: &MeshService,
) -> Resolution {
    let mut resolution = Resolution::default();

    for target in &snapshot.traffic_targets {
        let name = target_ref(target);
        // Unsupported destinations are reported once per snapshot by `unsupported_destinations`.
        let Some(dst) = subject_identity(target, &target.spec.destination) else {
            tracing::trace!(target = %name, kind = %target.spec.destination.kind, "skipping");
            continue;
        };

        if !providers
            .get_services_for_service_identity(&dst)
            .contains(destination)
        {
            continue;
        }
        tracing::trace!(target = %name, %destination, "traffic target applies");

        let target_routes = resolve_rules(target, &name, routes, &mut resolution.defects);
        if target_routes.is_empty() {
            continue;
        }

        let dst = TrafficResource {
            service_account: dst.name,
            namespace: dst.namespace,
            service: destination.clone(),
        };

        for subject in &target.spec.sources {
            let src = match subject_identity(target, subject) {
                Some(id) => id,
                None => {
                    resolution.defects.push(ResolveDefect::UnsupportedSubjectKind {
                        target: name.clone(),
                        kind: subject.kind.clone(),
                    });
                    continue;
                }
            };

            let services = providers.get_services_for_service_identity(&src);
            if services.is_empty() {
                tracing::debug!(target = %name, source = %src, "source identity has no services");
            }
            for service in services {
                let source = TrafficResource {
                    service_account: src.name.clone(),
                    namespace: src.namespace.clone(),
                    service,
                };
                resolution
                    .targets
                    .extend(target_routes.iter().map(|route| TrafficTarget {
                        name: target.name_any(),
                        destination: dst.clone(),
                        source: source.clone(),
                        route: route.clone(),
                    }));
            }
        }
    }

    for defect in &resolution.defects {
        tracing::warn!(%destination, %defect, "skipping traffic target element");
    }

    resolution
}

/// Lists the policies in `snapshot` whose destination cannot be resolved to an identity. These
/// policies never apply to any service.
pub fn unsupported_destinations(snapshot: &MeshSpecSnapshot) -> Vec<ResolveDefect> {
    snapshot
        .traffic_targets
        .iter()
        .filter(|target| subject_identity(target, &target.spec.destination).is_none())
        .map(|target| ResolveDefect::UnsupportedSubjectKind {
            target: target_ref(target),
            kind: target.spec.destination.kind.clone(),
        })
        .collect()
}

/// Returns the identity named by one of the policy's subjects. Subjects that omit a namespace are
/// in the policy's namespace.
pub(crate) fn subject_identity(
    target: &smi::TrafficTarget,
    subject: &smi::IdentityBindingSubject,
) -> Option<ServiceIdentity> {
    if subject.kind != smi::SERVICE_ACCOUNT_KIND {
        return None;
    }
    let namespace = subject
        .namespace
        .clone()
        .or_else(|| target.namespace())
        .unwrap_or_default();
    Some(ServiceIdentity {
        namespace,
        name: subject.name.clone(),
    })
}

fn resolve_rules(
    target: &smi::TrafficTarget,
    name: &str,
    routes: &RoutePolicyMap,
    defects: &mut Vec<ResolveDefect>,
) -> Vec<Route> {
    let kind = smi::HttpRouteGroup::kind(&());
    let namespace = target.namespace().unwrap_or_default();
    let mut resolved = Vec::new();

    for rule in &target.spec.rules {
        if rule.kind != kind {
            defects.push(ResolveDefect::UnsupportedRuleKind {
                target: name.to_string(),
                kind: rule.kind.clone(),
            });
            continue;
        }

        let spec = TrafficSpecName::new(&rule.kind, &namespace, &rule.name);
        let Some(group) = routes.get(&spec) else {
            defects.push(ResolveDefect::UnknownTrafficSpec {
                target: name.to_string(),
                spec,
            });
            continue;
        };

        // A rule without matches references every match in the group.
        if rule.matches.is_empty() {
            resolved.extend(group.values().cloned());
            continue;
        }

        for match_name in &rule.matches {
            let match_name = TrafficSpecMatchName::from(match_name.as_str());
            match group.get(&match_name) {
                Some(route) => resolved.push(route.clone()),
                None => defects.push(ResolveDefect::UnknownTrafficSpecMatch {
                    target: name.to_string(),
                    spec: spec.clone(),
                    match_name,
                }),
            }
        }
    }

    resolved
}

fn target_ref(target: &smi::TrafficTarget) -> String {
    format!(
        "{}/{}",
        target.namespace().unwrap_or_default(),
        target.name_any()
    )
}
