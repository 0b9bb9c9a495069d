use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use certify_core::{Certificate, CertificateDraft, CertificateId};

/// Certificate store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("certificate id already exists: {0}")]
    DuplicateId(CertificateId),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable, write-once storage of certificates keyed by id.
///
/// Implementations must enforce id uniqueness atomically inside `put`
/// and must not return from `put` before the record is durable.
pub trait CertificateStore: Send + Sync {
    /// Insert a new certificate, stamping `created_at`. Fails with
    /// [`StoreError::DuplicateId`] if the id is already taken.
    fn put(&self, draft: CertificateDraft) -> Result<Certificate, StoreError>;

    /// Exact-match lookup.
    fn get(&self, id: &CertificateId) -> Result<Option<Certificate>, StoreError>;

    /// Number of stored certificates.
    fn count(&self) -> Result<usize, StoreError>;
}

/// In-process certificate store. Not durable; used for tests and
/// ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    certificates: DashMap<CertificateId, Certificate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CertificateStore for MemoryStore {
    fn put(&self, draft: CertificateDraft) -> Result<Certificate, StoreError> {
        // The entry guard holds the shard lock, so check and insert are one step.
        match self.certificates.entry(draft.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(draft.id)),
            Entry::Vacant(slot) => {
                let certificate = draft.into_certificate(Utc::now());
                slot.insert(certificate.clone());
                tracing::debug!(certificate_id = %certificate.id, "certificate stored in memory");
                Ok(certificate)
            }
        }
    }

    fn get(&self, id: &CertificateId) -> Result<Option<Certificate>, StoreError> {
        Ok(self.certificates.get(id).map(|e| e.value().clone()))
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.certificates.len())
    }
}
