//! Mutation locks owned by the provider
//!
//! CLB listeners and their redirection rules reject concurrent changes on
//! the same load balancer, so their lifecycle functions hold the matching
//! lock around the mutating call. Other resource types obtain a named lock
//! from the registry on demand.

use tfretry::{LockRegistry, ResourceLock};

#[derive(Debug, Clone)]
pub struct ProviderLocks {
    pub clb_listener: ResourceLock,
    pub clb_redirection: ResourceLock,
    registry: LockRegistry,
}

impl Default for ProviderLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderLocks {
    pub fn new() -> Self {
        Self {
            clb_listener: ResourceLock::new("clb_listener"),
            clb_redirection: ResourceLock::new("clb_redirection"),
            registry: LockRegistry::new(),
        }
    }

    /// Lock for any other resource type, shared by name
    pub async fn for_resource(&self, resource_type: &str) -> ResourceLock {
        match resource_type {
            "clb_listener" => self.clb_listener.clone(),
            "clb_redirection" => self.clb_redirection.clone(),
            other => self.registry.get(other).await,
        }
    }
}
