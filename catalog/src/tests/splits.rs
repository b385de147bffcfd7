use super::*;
use mesh_catalog_core::{ClusterName, WeightedCluster};

#[test]
fn splits_resolve_to_backend_clusters() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        traffic_splits: vec![mk_split(
            NS,
            "bookstore-split",
            "bookstore",
            &[("bookstore-v1", 90), ("bookstore-v2", 10)],
        )],
        ..Default::default()
    });

    let clusters = test
        .catalog
        .get_weighted_clusters_for_service(&mk_service(NS, "bookstore"))
        .expect("clusters must resolve");
    assert_eq!(
        clusters,
        vec![
            WeightedCluster {
                cluster_name: ClusterName("default/bookstore-v1|14001".to_string()),
                weight: 90,
            },
            WeightedCluster {
                cluster_name: ClusterName("default/bookstore-v2|14001".to_string()),
                weight: 10,
            },
        ]
    );
}

#[test]
fn invalid_backends_are_skipped() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        traffic_splits: vec![mk_split(
            NS,
            "bookstore-split",
            "bookstore",
            &[
                ("bookstore-v1", -1),
                ("bookstore-v3", 50),
                ("bookstore-v2", 50),
            ],
        )],
        ..Default::default()
    });

    let clusters = test
        .catalog
        .get_weighted_clusters_for_service(&mk_service(NS, "bookstore"))
        .expect("clusters must resolve");
    assert_eq!(
        clusters,
        vec![WeightedCluster {
            cluster_name: ClusterName("default/bookstore-v2|14001".to_string()),
            weight: 50,
        }]
    );
}

#[test]
fn splits_only_apply_to_their_root_service() {
    let test = TestConfig::default();
    test.set_mesh_spec(MeshSpecSnapshot {
        traffic_splits: vec![
            mk_split("other", "bookstore-split", "bookstore", &[("bookstore-v1", 100)]),
            mk_split(NS, "bookbuyer-split", "bookbuyer", &[("bookstore-v1", 100)]),
        ],
        ..Default::default()
    });

    assert!(test
        .catalog
        .get_weighted_clusters_for_service(&mk_service(NS, "bookstore"))
        .expect("clusters must resolve")
        .is_empty());
}
