//! Shared fakes for integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pid_mint::{GlobalId, PidAssignment, RegistryClient, TokenSource};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Registry that knows a fixed set of identifiers and can be switched into
/// an outage.
#[derive(Default)]
pub struct FakeRegistry {
    registered: Mutex<HashSet<String>>,
    down: bool,
    lookups: AtomicUsize,
}

impl FakeRegistry {
    pub fn with_registered(pids: &[&str]) -> Self {
        Self {
            registered: Mutex::new(pids.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            down: true,
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn exists(&self, pid: &GlobalId) -> Result<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.registered.lock().unwrap().contains(&pid.to_string()))
    }
}

/// Token source that always hands out the same suffix.
pub struct FixedToken(pub &'static str);

impl TokenSource for FixedToken {
    fn next_token(&self, _len: usize) -> String {
        self.0.to_string()
    }
}

pub fn assignment(pid: &str) -> PidAssignment {
    PidAssignment::from_global_id(&GlobalId::parse(pid).expect("valid test pid"))
}
