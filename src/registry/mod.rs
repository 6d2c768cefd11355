//! External PID registry lookups
//!
//! Only existence checks live here. Creating, updating and deleting registry
//! records is the caller's business; this crate hands it the identifier and
//! the metadata document.

pub mod client;

pub use client::{DataCiteClient, HandleClient};

use crate::codec::GlobalId;
use anyhow::Result;
use async_trait::async_trait;

/// Remote registry, as seen by the uniqueness oracle.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Is `pid` already registered? Errors are allowed; the oracle decides
    /// what a failed lookup means.
    async fn exists(&self, pid: &GlobalId) -> Result<bool>;
}

/// Registry for protocols that resolve locally (permalinks): nothing is ever
/// registered remotely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteRegistry;

#[async_trait]
impl RegistryClient for NoRemoteRegistry {
    async fn exists(&self, _pid: &GlobalId) -> Result<bool> {
        Ok(false)
    }
}
