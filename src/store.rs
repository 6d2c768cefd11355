use crate::codec::GlobalId;
use anyhow::Result;
use async_trait::async_trait;

/// The local object store, as seen by the minting core.
///
/// Implementations must be safe to share across concurrent minting calls.
/// A uniqueness constraint on the stored triple is the real guard against two
/// callers persisting the same identifier; the generator only checks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Is any object already bound to `pid`?
    async fn exists_with_pid(&self, pid: &GlobalId) -> Result<bool>;

    /// Next value from the store's monotonic identifier counter.
    ///
    /// `Ok(None)` means the counter is not provisioned.
    async fn next_counter_value(&self) -> Result<Option<String>>;
}
