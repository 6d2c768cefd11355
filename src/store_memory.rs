//! In-memory [`ObjectStore`] for the CLI and tests

use crate::codec::GlobalId;
use crate::store::ObjectStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct MemoryStore {
    pids: Mutex<HashSet<GlobalId>>,
    /// `None` models a store without an identifier counter
    counter: Option<AtomicU64>,
}

impl MemoryStore {
    /// Empty store with no counter provisioned.
    pub fn new() -> Self {
        Self {
            pids: Mutex::new(HashSet::new()),
            counter: None,
        }
    }

    /// Empty store whose counter hands out `start`, `start + 1`, ...
    pub fn with_counter(start: u64) -> Self {
        Self {
            pids: Mutex::new(HashSet::new()),
            counter: Some(AtomicU64::new(start)),
        }
    }

    /// Bind `pid` to a (notional) stored object. Returns `false` if it was
    /// already taken, which is how the persistence layer reports a collision.
    pub fn insert(&self, pid: GlobalId) -> bool {
        self.pids.lock().unwrap().insert(pid)
    }

    pub fn len(&self) -> usize {
        self.pids.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists_with_pid(&self, pid: &GlobalId) -> Result<bool> {
        Ok(self.pids.lock().unwrap().contains(pid))
    }

    async fn next_counter_value(&self) -> Result<Option<String>> {
        Ok(self
            .counter
            .as_ref()
            .map(|c| c.fetch_add(1, Ordering::SeqCst).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exists_and_insert() {
        let store = MemoryStore::new();
        let pid = GlobalId::parse("doi:10.5072/FK2ABC").unwrap();
        assert!(!store.exists_with_pid(&pid).await.unwrap());
        assert!(store.insert(pid.clone()));
        assert!(!store.insert(pid.clone()));
        assert!(store.exists_with_pid(&pid).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_counter() {
        assert_eq!(MemoryStore::new().next_counter_value().await.unwrap(), None);

        let store = MemoryStore::with_counter(41);
        assert_eq!(store.next_counter_value().await.unwrap().as_deref(), Some("41"));
        assert_eq!(store.next_counter_value().await.unwrap().as_deref(), Some("42"));
    }
}
