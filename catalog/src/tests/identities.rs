use super::*;
use crate::CertificateNotFound;
use chrono::{Duration, Utc};
use mesh_catalog_core::Certificate;

fn policies() -> MeshSpecSnapshot {
    MeshSpecSnapshot {
        traffic_targets: vec![
            bookbuyer_access_bookstore(),
            mk_traffic_target(
                NS,
                "bookstore-clients",
                "bookstore",
                &["bookthief", "bookbuyer"],
                vec![],
            ),
            mk_traffic_target(
                NS,
                "bookbuyer-access-bookstore-v1",
                "bookstore-v1",
                &["bookbuyer"],
                vec![],
            ),
        ],
        ..Default::default()
    }
}

#[test]
fn allowed_inbound_identities() {
    let test = TestConfig::default();
    test.set_mesh_spec(policies());

    assert_eq!(
        test.catalog
            .list_allowed_inbound_service_identities(&ServiceIdentity::new(NS, "bookstore"))
            .expect("identities must list"),
        vec![
            ServiceIdentity::new(NS, "bookbuyer"),
            ServiceIdentity::new(NS, "bookthief"),
        ]
    );
    assert!(test
        .catalog
        .list_allowed_inbound_service_identities(&ServiceIdentity::new(NS, "bookbuyer"))
        .expect("identities must list")
        .is_empty());
}

#[test]
fn allowed_outbound_identities() {
    let test = TestConfig::default();
    test.set_mesh_spec(policies());

    assert_eq!(
        test.catalog
            .list_allowed_outbound_service_identities(&ServiceIdentity::new(NS, "bookbuyer"))
            .expect("identities must list"),
        vec![
            ServiceIdentity::new(NS, "bookstore"),
            ServiceIdentity::new(NS, "bookstore-v1"),
        ]
    );
    assert_eq!(
        test.catalog
            .list_allowed_outbound_service_identities(&ServiceIdentity::new(NS, "bookthief"))
            .expect("identities must list"),
        vec![ServiceIdentity::new(NS, "bookstore")]
    );
}

#[test]
fn certificates_are_looked_up_by_common_name() {
    let test = TestConfig::default();
    let bookbuyer = ServiceIdentity::new(NS, "bookbuyer");
    test.certificates.insert(Certificate {
        common_name: bookbuyer.common_name("cluster.local"),
        cert_chain: b"bookbuyer".to_vec(),
        expiration: Utc::now() + Duration::hours(1),
    });

    let cert = test
        .catalog
        .get_certificate_for_service_identity(&bookbuyer)
        .expect("certificate must be found");
    assert_eq!(cert.common_name.to_string(), "bookbuyer.default.cluster.local");

    let error = test
        .catalog
        .get_certificate_for_service_identity(&ServiceIdentity::new(NS, "bookthief"))
        .expect_err("bookthief has no certificate");
    assert!(error.downcast_ref::<CertificateNotFound>().is_some());
}

#[test]
fn expired_certificates_are_not_found() {
    let test = TestConfig::default();
    let bookstore = ServiceIdentity::new(NS, "bookstore");
    test.certificates.insert(Certificate {
        common_name: bookstore.common_name("cluster.local"),
        cert_chain: vec![],
        expiration: Utc::now() - Duration::minutes(1),
    });

    test.catalog
        .get_certificate_for_service_identity(&bookstore)
        .expect_err("expired certificates must not be returned");
}
