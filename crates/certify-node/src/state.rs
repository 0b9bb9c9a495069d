use std::sync::Arc;

use certify_credentials::{
    CertificateIssuer, CertificateStore, CertificateVerifier, Origin, VerificationCodeEncoder,
};

use crate::auth::SessionManager;
use crate::config::CertifyConfig;
use crate::storage::Storage;

/// Application state shared across all handlers.
pub struct AppState {
    pub config: CertifyConfig,
    pub storage: Arc<Storage>,
    pub issuer: CertificateIssuer,
    pub verifier: CertificateVerifier,
    pub sessions: SessionManager,
    /// Fixed origin from config, if any.
    pub public_origin: Option<Origin>,
}

impl AppState {
    /// Wire the services around an opened store.
    pub fn new(config: CertifyConfig, storage: Arc<Storage>) -> anyhow::Result<Self> {
        let encoder = VerificationCodeEncoder::new(config.code_options()?);
        let public_origin = config.public_origin()?;

        let store: Arc<dyn CertificateStore> = storage.clone();
        let issuer = CertificateIssuer::new(store.clone(), encoder);
        let verifier = CertificateVerifier::new(store);
        let sessions = SessionManager::new(storage.clone(), config.session.ttl_secs);

        Ok(Self {
            config,
            storage,
            issuer,
            verifier,
            sessions,
            public_origin,
        })
    }

    /// Host used when a request carries no usable host information.
    pub fn fallback_host(&self) -> String {
        self.config.api_addr()
    }
}
