use super::*;
use crate::RouteDefect;
use mesh_catalog_core::{TrafficSpecMatchName, TrafficSpecName};

#[test]
fn route_group_spec_name() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![mk_route_group(
            "ns",
            "rg",
            vec![mk_match("all", Some(".*"), BTreeMap::new())],
        )],
        ..Default::default()
    });

    let index = test.catalog.http_paths_per_route().expect("routes must index");
    let names = index.routes.keys().map(ToString::to_string).collect::<Vec<_>>();
    assert_eq!(names, vec!["HTTPRouteGroup/ns/rg".to_string()]);
}

#[test]
fn indexes_matches_with_and_without_headers() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![mk_route_group(
            "ns",
            "rg",
            vec![
                mk_match(
                    "buy",
                    Some("/buy"),
                    btreemap! { "host".to_string() => "example.com".to_string() },
                ),
                mk_match("sell", Some("/sell"), BTreeMap::new()),
            ],
        )],
        ..Default::default()
    });

    let index = test.catalog.http_paths_per_route().expect("routes must index");
    assert!(index.defects.is_empty());
    assert_eq!(index.routes.len(), 1);
    assert_eq!(
        index.routes[&TrafficSpecName::new("HTTPRouteGroup", "ns", "rg")],
        btreemap! {
            TrafficSpecMatchName::from("buy") => Route {
                path_regex: "/buy".to_string(),
                methods: vec!["GET".to_string()],
                headers: btreemap! { "host".to_string() => "example.com".to_string() },
            },
            TrafficSpecMatchName::from("sell") => Route {
                path_regex: "/sell".to_string(),
                methods: vec!["GET".to_string()],
                headers: BTreeMap::new(),
            },
        }
    );
}

#[test]
fn groups_with_missing_paths_are_skipped() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![
            mk_route_group(
                NS,
                "no-path",
                vec![
                    mk_match("ok", Some("/ok"), BTreeMap::new()),
                    mk_match("missing", None, BTreeMap::new()),
                ],
            ),
            bookstore_routes(),
        ],
        ..Default::default()
    });

    let index = test.catalog.http_paths_per_route().expect("routes must index");
    assert_eq!(
        index.routes.keys().cloned().collect::<Vec<_>>(),
        vec![TrafficSpecName::new("HTTPRouteGroup", NS, BOOKSTORE_ROUTES)]
    );
    assert_eq!(index.defects.len(), 1);
    assert!(matches!(
        &index.defects[0],
        RouteDefect::MissingPathRegex { match_name, .. } if match_name.to_string() == "missing"
    ));
}

#[test]
fn groups_with_invalid_paths_are_skipped() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![
            bookstore_routes(),
            mk_route_group(NS, "invalid", vec![mk_match("bad", Some("/(buy"), BTreeMap::new())]),
        ],
        ..Default::default()
    });

    let index = test.catalog.http_paths_per_route().expect("routes must index");
    assert_eq!(index.routes.len(), 1);
    assert!(index
        .routes
        .contains_key(&TrafficSpecName::new("HTTPRouteGroup", NS, BOOKSTORE_ROUTES)));
    assert!(matches!(
        &index.defects[..],
        [RouteDefect::InvalidPathRegex { .. }]
    ));
}

#[test]
fn duplicate_matches_keep_the_last_declaration() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![mk_route_group(
            NS,
            "dup",
            vec![
                mk_match("books", Some("/first"), BTreeMap::new()),
                mk_match("books", Some("/second"), BTreeMap::new()),
            ],
        )],
        ..Default::default()
    });

    let index = test.catalog.http_paths_per_route().expect("routes must index");
    let group = &index.routes[&TrafficSpecName::new("HTTPRouteGroup", NS, "dup")];
    assert_eq!(group.len(), 1);
    assert_eq!(group[&TrafficSpecMatchName::from("books")].path_regex, "/second");
    assert!(matches!(
        &index.defects[..],
        [RouteDefect::DuplicateMatch { .. }]
    ));
}

#[test]
fn route_index_is_reused_until_the_snapshot_changes() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![bookstore_routes()],
        ..Default::default()
    });

    let first = test.catalog.http_paths_per_route().expect("routes must index");
    let second = test.catalog.http_paths_per_route().expect("routes must index");
    assert!(Arc::ptr_eq(&first, &second));

    test.set_mesh_spec(MeshSpecSnapshot::default());
    let third = test.catalog.http_paths_per_route().expect("routes must index");
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(third.routes.is_empty());

    // Indexes that were handed out are never modified.
    assert_eq!(first.routes.len(), 1);
}

#[test]
fn route_index_requires_a_snapshot() {
    let test = TestConfig::default();
    test.mesh_spec_unavailable();
    test.catalog
        .http_paths_per_route()
        .expect_err("routes must not index without a snapshot");
}

#[test]
fn dropped_groups_report_only_why_they_were_dropped() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![mk_route_group(
            NS,
            "dup-then-missing",
            vec![
                mk_match("books", Some("/first"), BTreeMap::new()),
                mk_match("books", Some("/second"), BTreeMap::new()),
                mk_match("missing", None, BTreeMap::new()),
            ],
        )],
        ..Default::default()
    });

    let index = test.catalog.http_paths_per_route().expect("routes must index");
    assert!(index.routes.is_empty());
    assert!(matches!(
        &index.defects[..],
        [RouteDefect::MissingPathRegex { match_name, .. }] if match_name.to_string() == "missing"
    ));
}

#[test]
fn superseded_snapshots_do_not_replace_the_memoized_index() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        route_groups: vec![bookstore_routes()],
        ..Default::default()
    });
    let stale = test.mesh_spec.snapshot().expect("snapshot must be available");

    test.set_mesh_spec(MeshSpecSnapshot::default());
    let current = test.catalog.http_paths_per_route().expect("routes must index");
    assert!(current.routes.is_empty());

    // A caller still holding the older snapshot gets that snapshot's routes.
    let routes = test.catalog.route_index(&stale);
    assert_eq!(routes.routes.len(), 1);

    let again = test.catalog.http_paths_per_route().expect("routes must index");
    assert!(Arc::ptr_eq(&current, &again));
}
