//! Shared fixtures for the cross-crate issuance and verification flows.

use std::sync::Arc;

use certify_credentials::{
    CertificateIssuer, CertificateStore, CertificateVerifier, MemoryStore, Origin,
    VerificationCodeEncoder,
};

/// Issuer and verifier sharing one store.
pub struct Registry {
    pub store: Arc<MemoryStore>,
    pub issuer: CertificateIssuer,
    pub verifier: CertificateVerifier,
}

impl Registry {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn CertificateStore> = store.clone();
        Self {
            issuer: CertificateIssuer::new(shared.clone(), VerificationCodeEncoder::default()),
            verifier: CertificateVerifier::new(shared),
            store,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Origin a local deployment is reached under.
pub fn local_origin() -> Origin {
    Origin::new("http", "localhost:3000")
}
