//! Integration test: issuance across certify-core, certify-crypto and
//! certify-credentials.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use certify_core::{CoreError, IssueRequest};
use certify_credentials::{
    certificate_id_from_url, decode_artifact, CertificateStore, CredentialError,
};
use certify_integration_tests::{local_origin, Registry};
use chrono::NaiveDate;

// =========================================================================
// Single issuance
// =========================================================================

#[test]
fn test_ada_lovelace_scenario() {
    let registry = Registry::new();

    let cert = registry
        .issuer
        .issue(
            IssueRequest::new("Ada Lovelace", "Systems Design", Some("2024-01-15".into())),
            &local_origin(),
        )
        .expect("issuance should succeed");

    assert_eq!(cert.recipient_name, "Ada Lovelace");
    assert_eq!(cert.course_name, "Systems Design");
    assert_eq!(cert.issue_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

    let url = decode_artifact(&cert.verification_artifact).expect("artifact should decode");
    assert_eq!(url, format!("http://localhost:3000/verify?id={}", cert.id));
    assert_eq!(certificate_id_from_url(&url), Some(cert.id.clone()));

    let stored = registry.store.get(&cert.id).unwrap().unwrap();
    assert_eq!(stored, cert);
}

#[test]
fn test_artifacts_bind_their_own_id() {
    let registry = Registry::new();

    for i in 0..10 {
        let cert = registry
            .issuer
            .issue(
                IssueRequest::new(format!("Recipient {}", i), "Compilers", None),
                &local_origin(),
            )
            .unwrap();
        let url = decode_artifact(&cert.verification_artifact).unwrap();
        assert_eq!(certificate_id_from_url(&url), Some(cert.id));
    }
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_invalid_requests_write_nothing() {
    let registry = Registry::new();

    let cases = vec![
        IssueRequest::new("", "Systems Design", None),
        IssueRequest::new("   ", "Systems Design", None),
        IssueRequest {
            recipient_name: Some("Ada".into()),
            course_name: None,
            issue_date: None,
        },
        IssueRequest::new("Ada", "Systems Design", Some("15/01/2024".into())),
    ];

    for req in cases {
        let result = registry.issuer.issue(req, &local_origin());
        assert!(matches!(result, Err(CredentialError::Validation(_))));
    }
    assert_eq!(registry.store.count().unwrap(), 0);
}

#[test]
fn test_missing_course_reports_field() {
    let registry = Registry::new();
    let result = registry.issuer.issue(
        IssueRequest {
            recipient_name: Some("Ada".into()),
            ..Default::default()
        },
        &local_origin(),
    );
    assert!(matches!(
        result,
        Err(CredentialError::Validation(CoreError::MissingField(ref f))) if f == "courseName"
    ));
}

// =========================================================================
// Concurrency
// =========================================================================

#[test]
fn test_concurrent_issuance_yields_distinct_records() {
    const WORKERS: usize = 8;
    const PER_WORKER: usize = 25;

    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..WORKERS)
        .map(|w| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..PER_WORKER)
                    .map(|i| {
                        registry
                            .issuer
                            .issue(
                                IssueRequest::new(format!("Worker {} #{}", w, i), "Math", None),
                                &local_origin(),
                            )
                            .expect("issuance should succeed")
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(ids.len(), WORKERS * PER_WORKER);
    assert_eq!(registry.store.count().unwrap(), WORKERS * PER_WORKER);
}
