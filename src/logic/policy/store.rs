//! Policy Store Seam
//!
//! Lookup of the policy governing a resource. A single evaluation must see
//! one consistent snapshot even while an administrative path mutates
//! policies, so `get` hands out a clone taken under the read lock - never a
//! reference into shared state.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::PolicyStoreError;
use crate::logic::policy::types::Policy;

// ============================================================================
// TRAIT
// ============================================================================

/// The policy lookup collaborator. A missing policy is `Ok(None)`; `Err` is
/// reserved for connectivity-class failures.
pub trait PolicyStore: Send + Sync {
    fn get(&self, resource_id: &str) -> Result<Option<Policy>, PolicyStoreError>;
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory policy store with atomic snapshots.
#[derive(Default)]
pub struct MemoryPolicyStore {
    policies: RwLock<HashMap<String, Policy>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the policy for its resource.
    pub fn upsert(&self, policy: Policy) {
        self.policies
            .write()
            .insert(policy.resource_id.clone(), policy);
    }

    pub fn remove(&self, resource_id: &str) -> Option<Policy> {
        self.policies.write().remove(resource_id)
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn get(&self, resource_id: &str) -> Result<Option<Policy>, PolicyStoreError> {
        Ok(self.policies.read().get(resource_id).cloned())
    }
}

// ============================================================================
// TESTS
// ============================================================================
