use chrono::Utc;
use std::sync::Arc;

use certify_core::{Certificate, CertificateDraft, IssueRequest, NewCertificate};
use certify_crypto::{IdentifierGenerator, RandomIdGenerator};

use crate::code::VerificationCodeEncoder;
use crate::error::CredentialError;
use crate::origin::Origin;
use crate::store::CertificateStore;

/// Issues certificates: assigns an id, binds it to a verification code,
/// and persists the result.
pub struct CertificateIssuer {
    store: Arc<dyn CertificateStore>,
    encoder: VerificationCodeEncoder,
    ids: Arc<dyn IdentifierGenerator>,
}

impl CertificateIssuer {
    /// Create an issuer that generates random UUID identifiers.
    pub fn new(store: Arc<dyn CertificateStore>, encoder: VerificationCodeEncoder) -> Self {
        Self {
            store,
            encoder,
            ids: Arc::new(RandomIdGenerator),
        }
    }

    /// Replace the identifier source.
    pub fn with_generator(mut self, ids: Arc<dyn IdentifierGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Validate a raw request and issue a certificate.
    ///
    /// Nothing is written unless validation and code encoding succeed.
    pub fn issue(
        &self,
        request: IssueRequest,
        origin: &Origin,
    ) -> Result<Certificate, CredentialError> {
        let new = request.validate()?;
        self.issue_validated(new, origin)
    }

    /// Issue a certificate from already validated input.
    ///
    /// A duplicate id from the store is reported as-is and not retried.
    pub fn issue_validated(
        &self,
        new: NewCertificate,
        origin: &Origin,
    ) -> Result<Certificate, CredentialError> {
        let id = self.ids.generate();
        let verification_url = origin.verification_url(&id);
        let verification_artifact = self.encoder.encode(&verification_url)?;
        let issue_date = new.issue_date.unwrap_or_else(|| Utc::now().date_naive());

        let draft = CertificateDraft {
            id,
            recipient_name: new.recipient_name,
            course_name: new.course_name,
            issue_date,
            verification_artifact,
        };

        let certificate = self.store.put(draft).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist certificate");
        })?;

        tracing::info!(
            certificate_id = %certificate.id,
            issue_date = %certificate.issue_date,
            %verification_url,
            "certificate issued"
        );

        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{decode_artifact, CodeOptions};
    use crate::store::MemoryStore;
    use certify_core::{CertificateId, CoreError};
    use chrono::NaiveDate;

    struct FixedIds(&'static str);

    impl IdentifierGenerator for FixedIds {
        fn generate(&self) -> CertificateId {
            CertificateId::new(self.0)
        }
    }

    fn origin() -> Origin {
        Origin::new("http", "localhost:3000")
    }

    fn setup() -> (CertificateIssuer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let issuer = CertificateIssuer::new(store.clone(), VerificationCodeEncoder::default());
        (issuer, store)
    }

    #[test]
    fn test_issue_certificate() {
        let (issuer, store) = setup();
        let cert = issuer
            .issue(
                IssueRequest::new("Ada Lovelace", "Systems Design", Some("2024-01-15".into())),
                &origin(),
            )
            .unwrap();

        assert_eq!(cert.recipient_name, "Ada Lovelace");
        assert_eq!(cert.course_name, "Systems Design");
        assert_eq!(cert.issue_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(store.get(&cert.id).unwrap(), Some(cert.clone()));
    }

    #[test]
    fn test_artifact_encodes_verification_url() {
        let (issuer, _store) = setup();
        let cert = issuer
            .issue(IssueRequest::new("Ada", "Math", None), &origin())
            .unwrap();
        let url = decode_artifact(&cert.verification_artifact).unwrap();
        assert_eq!(url, format!("http://localhost:3000/verify?id={}", cert.id));
    }

    #[test]
    fn test_issue_date_defaults_to_today() {
        let (issuer, _store) = setup();
        let before = Utc::now().date_naive();
        let cert = issuer
            .issue(IssueRequest::new("Ada", "Math", None), &origin())
            .unwrap();
        let after = Utc::now().date_naive();
        assert!(cert.issue_date == before || cert.issue_date == after);
    }

    #[test]
    fn test_validation_failure_writes_nothing() {
        let (issuer, store) = setup();
        let result = issuer.issue(IssueRequest::new("", "Math", None), &origin());
        assert!(matches!(
            result,
            Err(CredentialError::Validation(CoreError::MissingField(_)))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_encoding_failure_writes_nothing() {
        let (issuer, store) = setup();
        let huge_host = format!("{}.example.org", "h".repeat(3000));
        let result = issuer.issue(
            IssueRequest::new("Ada", "Math", None),
            &Origin::new("http", huge_host),
        );
        assert!(matches!(result, Err(CredentialError::Encoding(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_id_fails_closed() {
        let store = Arc::new(MemoryStore::new());
        let issuer = CertificateIssuer::new(store.clone(), VerificationCodeEncoder::default())
            .with_generator(Arc::new(FixedIds("fixed-id")));

        let first = issuer
            .issue(IssueRequest::new("Ada", "Math", None), &origin())
            .unwrap();
        let second = issuer.issue(IssueRequest::new("Grace", "Compilers", None), &origin());

        assert!(matches!(second, Err(CredentialError::DuplicateId(ref id)) if id.as_str() == "fixed-id"));
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(&first.id).unwrap().unwrap().recipient_name, "Ada");
    }

    #[test]
    fn test_ids_unique_across_issuances() {
        let (issuer, store) = setup();
        let ids: std::collections::HashSet<_> = (0..25)
            .map(|i| {
                issuer
                    .issue(IssueRequest::new(format!("Recipient {}", i), "Math", None), &origin())
                    .unwrap()
                    .id
            })
            .collect();
        assert_eq!(ids.len(), 25);
        assert_eq!(store.count().unwrap(), 25);
    }

    #[test]
    fn test_custom_code_options() {
        let store = Arc::new(MemoryStore::new());
        let issuer = CertificateIssuer::new(
            store,
            VerificationCodeEncoder::new(CodeOptions::new(400, 2).unwrap()),
        );
        let cert = issuer
            .issue(IssueRequest::new("Ada", "Math", None), &origin())
            .unwrap();
        assert!(decode_artifact(&cert.verification_artifact)
            .unwrap()
            .ends_with(cert.id.as_str()));
    }
}
