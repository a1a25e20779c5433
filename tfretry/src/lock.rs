//! Explicit per-resource-type mutation locks
//!
//! Some remote object types cannot tolerate two mutations interleaving from
//! the same process (load balancer listeners, redirection rules). Lifecycle
//! code takes the lock for that type around the mutating call. Locks only
//! serialize within the process; cross-process races are left to the API.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Async mutex guarding mutations of one resource type
#[derive(Clone, Debug)]
pub struct ResourceLock {
    name: Arc<str>,
    mutex: Arc<Mutex<()>>,
}

/// Held while a mutation is in flight; released on drop
#[derive(Debug)]
pub struct ResourceLockGuard {
    name: Arc<str>,
    _guard: OwnedMutexGuard<()>,
}

impl ResourceLockGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ResourceLockGuard {
    fn drop(&mut self) {
        tracing::trace!("Released resource lock {}", self.name);
    }
}

impl ResourceLock {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            mutex: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn acquire(&self) -> ResourceLockGuard {
        tracing::trace!("Waiting for resource lock {}", self.name);
        let guard = self.mutex.clone().lock_owned().await;
        tracing::trace!("Acquired resource lock {}", self.name);

        ResourceLockGuard {
            name: self.name.clone(),
            _guard: guard,
        }
    }

    /// Returns the guard only if nobody holds the lock
    pub fn try_acquire(&self) -> Option<ResourceLockGuard> {
        let guard = self.mutex.clone().try_lock_owned().ok()?;
        Some(ResourceLockGuard {
            name: self.name.clone(),
            _guard: guard,
        })
    }

    /// Run `f` while holding the lock
    pub async fn with_lock<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire().await;
        f().await
    }
}

/// Hands out one [`ResourceLock`] per name, created on first use
#[derive(Clone, Debug, Default)]
pub struct LockRegistry {
    locks: Arc<RwLock<HashMap<String, ResourceLock>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> ResourceLock {
        if let Some(lock) = self.locks.read().await.get(name) {
            return lock.clone();
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| ResourceLock::new(name))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}
