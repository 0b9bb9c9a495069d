//! Integration test: verification of issued and unknown certificates.

use certify_core::IssueRequest;
use certify_credentials::{VerificationReport, VerificationResult};
use certify_integration_tests::{local_origin, Registry};

fn issue_one(registry: &Registry) -> certify_core::Certificate {
    registry
        .issuer
        .issue(
            IssueRequest::new("Grace Hopper", "Compilers", Some("2023-12-09".into())),
            &local_origin(),
        )
        .unwrap()
}

// =========================================================================
// Issued certificates
// =========================================================================

#[test]
fn test_verify_returns_issued_record() {
    let registry = Registry::new();
    let cert = issue_one(&registry);

    match registry.verifier.verify(cert.id.as_str()).unwrap() {
        VerificationResult::Valid(found) => assert_eq!(found, cert),
        VerificationResult::NotFound => panic!("issued certificate should verify"),
    }
}

#[test]
fn test_verify_is_idempotent() {
    let registry = Registry::new();
    let cert = issue_one(&registry);

    let first = registry.verifier.verify(cert.id.as_str()).unwrap();
    for _ in 0..10 {
        assert_eq!(registry.verifier.verify(cert.id.as_str()).unwrap(), first);
    }
    assert_eq!(
        serde_json::to_value(VerificationReport::from(first.clone())).unwrap(),
        serde_json::to_value(VerificationReport::from(
            registry.verifier.verify(cert.id.as_str()).unwrap()
        ))
        .unwrap()
    );
}

#[test]
fn test_report_carries_all_fields() {
    let registry = Registry::new();
    let cert = issue_one(&registry);

    let report = VerificationReport::from(registry.verifier.verify(cert.id.as_str()).unwrap());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["valid"], true);
    let body = &json["certificate"];
    assert_eq!(body["id"], cert.id.as_str());
    assert_eq!(body["recipientName"], "Grace Hopper");
    assert_eq!(body["courseName"], "Compilers");
    assert_eq!(body["issueDate"], "2023-12-09");
    assert_eq!(body["verificationArtifact"], cert.verification_artifact.as_str());
    assert!(body["createdAt"].is_string());
}

// =========================================================================
// Unknown ids
// =========================================================================

#[test]
fn test_unknown_id_is_not_found() {
    let registry = Registry::new();
    issue_one(&registry);

    let result = registry.verifier.verify("nonexistent-id").unwrap();
    assert_eq!(result, VerificationResult::NotFound);

    let json = serde_json::to_string(&VerificationReport::from(result)).unwrap();
    assert_eq!(json, r#"{"valid":false}"#);
}

#[test]
fn test_near_miss_ids_are_not_found() {
    let registry = Registry::new();
    let cert = issue_one(&registry);
    let id = cert.id.as_str();

    for probe in [
        id.to_uppercase(),
        format!(" {}", id),
        id[..id.len() - 1].to_string(),
        format!("{}x", id),
    ] {
        assert_eq!(
            registry.verifier.verify(&probe).unwrap(),
            VerificationResult::NotFound,
            "probe {:?} should not match",
            probe
        );
    }
}
