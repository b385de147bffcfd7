//! Indexes the HTTP matches declared by route groups.

use mesh_catalog_core::{Route, RoutePolicyMap, TrafficSpecMatchName, TrafficSpecName};
use mesh_catalog_k8s_api::{smi::HttpRouteGroup, Resource, ResourceExt};
use regex::Regex;
use std::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
};

/// The routes declared by a snapshot's route groups.
#[derive(Debug, Default)]
pub struct RouteIndex {
    pub routes: RoutePolicyMap,

    /// Problems encountered while indexing. Defects never prevent other route groups from being
    /// indexed.
    pub defects: Vec<RouteDefect>,
}

#[derive(Debug, thiserror::Error)]
pub enum RouteDefect {
    /// The route group is not indexed.
    #[error("{spec}: match {match_name} does not specify a path regex")]
    MissingPathRegex {
        spec: TrafficSpecName,
        match_name: TrafficSpecMatchName,
    },

    /// The route group is not indexed.
    #[error("{spec}: match {match_name} has an invalid path regex: {source}")]
    InvalidPathRegex {
        spec: TrafficSpecName,
        match_name: TrafficSpecMatchName,
        #[source]
        source: regex::Error,
    },

    /// The last declaration of the match is indexed. Only reported for route groups that are
    /// indexed.
    #[error("{spec}: match {match_name} is declared more than once")]
    DuplicateMatch {
        spec: TrafficSpecName,
        match_name: TrafficSpecMatchName,
    },
}

/// Builds the route index for the given route groups.
pub fn http_paths_per_route(groups: &[Arc<HttpRouteGroup>]) -> RouteIndex {
    let kind = HttpRouteGroup::kind(&());
    let mut index = RouteIndex::default();

    for group in groups {
        let spec = TrafficSpecName::new(
            &kind,
            &group.namespace().unwrap_or_default(),
            &group.name_any(),
        );

        match group_routes(&spec, group) {
            Ok((routes, duplicates)) => {
                for defect in &duplicates {
                    tracing::warn!(%defect, "overriding earlier match");
                }
                tracing::debug!(%spec, matches = routes.len(), "indexed route group");
                index.routes.insert(spec, routes);
                index.defects.extend(duplicates);
            }
            Err(defect) => {
                tracing::warn!(%defect, "skipping route group");
                index.defects.push(defect);
            }
        }
    }

    index
}

type GroupRoutes = BTreeMap<TrafficSpecMatchName, Route>;

/// Indexes a group's matches, returning them with the group's duplicate match defects.
fn group_routes(
    spec: &TrafficSpecName,
    group: &HttpRouteGroup,
) -> Result<(GroupRoutes, Vec<RouteDefect>), RouteDefect> {
    let mut routes = BTreeMap::new();
    let mut duplicates = Vec::new();

    for m in &group.spec.matches {
        let match_name = TrafficSpecMatchName::from(m.name.as_str());
        let path_regex = match m.path_regex.as_deref() {
            Some(path) => path,
            None => {
                return Err(RouteDefect::MissingPathRegex {
                    spec: spec.clone(),
                    match_name,
                })
            }
        };
        if let Err(source) = Regex::new(path_regex) {
            return Err(RouteDefect::InvalidPathRegex {
                spec: spec.clone(),
                match_name,
                source,
            });
        }

        let route = Route {
            path_regex: path_regex.to_string(),
            methods: m.methods.clone(),
            headers: m.headers.clone(),
        };
        match routes.entry(match_name) {
            Entry::Vacant(entry) => {
                entry.insert(route);
            }
            Entry::Occupied(mut entry) => {
                duplicates.push(RouteDefect::DuplicateMatch {
                    spec: spec.clone(),
                    match_name: entry.key().clone(),
                });
                entry.insert(route);
            }
        }
    }

    Ok((routes, duplicates))
}
