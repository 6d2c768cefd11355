//! Uniqueness oracle
//!
//! Two-phase check for a candidate identifier: the local store is
//! authoritative, the remote registry is best effort. A registry that errors
//! or times out never blocks minting; the candidate is assumed free and any
//! real collision surfaces later as a registration conflict.

use crate::codec::GlobalId;
use crate::error::{PidError, Result};
use crate::registry::RegistryClient;
use crate::store::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct UniquenessOracle {
    store: Arc<dyn ObjectStore>,
    registry: Arc<dyn RegistryClient>,
    registry_timeout: Duration,
}

impl UniquenessOracle {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registry: Arc<dyn RegistryClient>,
        registry_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            registry_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Is `candidate` free to allocate?
    ///
    /// Local store errors propagate: without the authoritative answer there
    /// is nothing to decide on.
    pub async fn is_unique(&self, candidate: &GlobalId) -> Result<bool> {
        if self
            .store
            .exists_with_pid(candidate)
            .await
            .map_err(PidError::Store)?
        {
            debug!("{} already bound locally", candidate);
            return Ok(false);
        }

        match timeout(self.registry_timeout, self.registry.exists(candidate)).await {
            Ok(Ok(exists)) => {
                if exists {
                    debug!("{} already registered remotely", candidate);
                }
                Ok(!exists)
            }
            Ok(Err(e)) => {
                warn!(
                    "Registry lookup for {} failed, assuming unique: {:#}",
                    candidate, e
                );
                Ok(true)
            }
            Err(_) => {
                warn!(
                    "Registry lookup for {} timed out after {:?}, assuming unique",
                    candidate, self.registry_timeout
                );
                Ok(true)
            }
        }
    }
}
