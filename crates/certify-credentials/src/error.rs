use certify_core::{CertificateId, CoreError};

use crate::code::EncodingError;
use crate::store::StoreError;

/// Issuance and verification errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("validation failed: {0}")]
    Validation(#[from] CoreError),

    #[error("verification code encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("duplicate certificate id: {0}")]
    DuplicateId(CertificateId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateId(id) => Self::DuplicateId(id),
            other => Self::Storage(other.to_string()),
        }
    }
}
