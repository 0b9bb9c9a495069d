use serde::{Deserialize, Serialize};
use std::sync::Arc;

use certify_core::{Certificate, CertificateId};

use crate::error::CredentialError;
use crate::store::CertificateStore;

/// Outcome of resolving a certificate id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The id belongs to an issued certificate.
    Valid(Certificate),
    /// No certificate has this id.
    NotFound,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        match self {
            Self::Valid(cert) => Some(cert),
            Self::NotFound => None,
        }
    }
}

/// Machine-readable rendering of a [`VerificationResult`].
///
/// Serializes as `{"valid":true,"certificate":{...}}` or `{"valid":false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

impl From<VerificationResult> for VerificationReport {
    fn from(result: VerificationResult) -> Self {
        match result {
            VerificationResult::Valid(cert) => Self {
                valid: true,
                certificate: Some(cert),
            },
            VerificationResult::NotFound => Self {
                valid: false,
                certificate: None,
            },
        }
    }
}

/// Resolves certificate ids against the store.
pub struct CertificateVerifier {
    store: Arc<dyn CertificateStore>,
}

impl CertificateVerifier {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }

    /// Look up `id` exactly as given.
    ///
    /// Unknown ids are a normal outcome, not an error; only storage
    /// failures produce `Err`.
    pub fn verify(&self, id: &str) -> Result<VerificationResult, CredentialError> {
        if id.is_empty() {
            return Ok(VerificationResult::NotFound);
        }

        match self.store.get(&CertificateId::from(id))? {
            Some(cert) => {
                tracing::debug!(certificate_id = %cert.id, "certificate verified");
                Ok(VerificationResult::Valid(cert))
            }
            None => {
                tracing::debug!(certificate_id = id, "certificate not found");
                Ok(VerificationResult::NotFound)
            }
        }
    }
}
