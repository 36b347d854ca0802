//! Backend provider for IBM Quantum devices

use crate::backend::{BackendResponse, BackendStatus, IbmBackend};
use crate::client::IbmClient;
use crate::credentials::{Credentials, CredentialsManager};
use crate::error::{IBMError, Result};
use log::warn;
use qbench_core::{Backend, BackendProvider};
use std::sync::Arc;

/// Resolves device names through the `/backends` endpoint
pub struct IbmProvider {
    client: Arc<IbmClient>,
}

impl IbmProvider {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: Arc::new(IbmClient::new(credentials)?),
        })
    }

    /// Provider using credentials found by [`CredentialsManager::load`]
    pub fn from_env() -> Result<Self> {
        Self::new(CredentialsManager::load()?)
    }

    /// All devices visible to the account
    pub fn backends(&self) -> Result<Vec<IbmBackend>> {
        let response: BackendResponse = self.client.get("backends")?;
        Ok(response
            .backends
            .iter()
            .map(|data| IbmBackend::from_data(data, Arc::clone(&self.client)))
            .collect())
    }

    /// Device named `name`
    pub fn backend(&self, name: &str) -> Result<IbmBackend> {
        let backend = self
            .backends()?
            .into_iter()
            .find(|b| b.name() == name)
            .ok_or_else(|| IBMError::BackendNotFound(name.to_string()))?;

        if backend.status() != BackendStatus::Online {
            warn!(
                "Backend {} is {:?}; jobs may wait in the queue",
                name,
                backend.status()
            );
        }
        Ok(backend)
    }
}

impl BackendProvider for IbmProvider {
    fn get_backend(&self, name: &str) -> qbench_core::Result<Arc<dyn Backend>> {
        let backend = self.backend(name)?;
        Ok(Arc::new(backend))
    }
}
