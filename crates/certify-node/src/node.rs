//! The Certify node orchestrator.
//!
//! Owns the store handle for the process lifetime, seeds the admin
//! principal, and runs the HTTP API until shutdown.

use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::seed_admin;
use crate::config::CertifyConfig;
use crate::state::AppState;
use crate::storage::Storage;

pub struct CertifyNode {
    config: CertifyConfig,
    storage: Option<Arc<Storage>>,
    state: Option<Arc<AppState>>,
}

impl CertifyNode {
    pub fn new(config: CertifyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            storage: None,
            state: None,
        })
    }

    /// Open storage, seed the admin principal and wire the services.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting Certify node");

        let data_dir = self.config.storage.data_dir.clone();
        let storage = Arc::new(
            Storage::open(&data_dir)
                .with_context(|| format!("failed to open store at {}", data_dir.display()))?,
        );
        tracing::info!(path = %data_dir.display(), "storage initialized");

        // Argon2 hashing is CPU-bound.
        let seed_storage = storage.clone();
        let admin = self.config.admin.clone();
        tokio::task::spawn_blocking(move || {
            seed_admin(&seed_storage, &admin.username, &admin.password)
        })
        .await??;

        let state = Arc::new(AppState::new(self.config.clone(), storage.clone())?);

        let sweep_state = state.clone();
        let purged = tokio::task::spawn_blocking(move || sweep_state.sessions.purge_expired())
            .await??;
        tracing::info!(purged, "expired sessions swept");
        if let Some(origin) = &state.public_origin {
            tracing::info!(%origin, "using fixed public origin for verification URLs");
        }

        self.storage = Some(storage);
        self.state = Some(state);
        Ok(())
    }

    /// Serve the HTTP API until `shutdown` resolves.
    pub async fn run(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let state = self
            .state
            .clone()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        let api_addr: SocketAddr = self
            .config
            .api_addr()
            .parse()
            .with_context(|| format!("invalid listen address {}", self.config.api_addr()))?;

        crate::api::start_api_server(api_addr, state, shutdown).await
    }

    /// Serve until `shutdown` resolves or the server fails, then release
    /// the store. A server failure is returned after shutdown completes.
    pub async fn serve(
        &mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let served = self.run(shutdown).await;
        if let Err(e) = &served {
            tracing::error!(error = %e, "HTTP API server error");
        }
        self.shutdown().await?;
        served
    }

    /// Release the store handle.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Certify node");

        self.state = None;
        if let Some(storage) = self.storage.take() {
            drop(storage);
            tracing::info!("storage closed");
        }

        tracing::info!("Certify node shut down");
        Ok(())
    }

    /// Shared handler state, once started.
    pub fn state(&self) -> Option<&Arc<AppState>> {
        self.state.as_ref()
    }
}
