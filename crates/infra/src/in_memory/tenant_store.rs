use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use vendora_core::TenantId;

use crate::error::StoreError;

/// In-memory tenant-isolated map for tests/dev.
///
/// Keys are always paired with the tenant, so a lookup with the right id but
/// the wrong tenant misses.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    inner: RwLock<HashMap<(TenantId, K), V>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&(tenant_id, key.clone())).cloned())
    }

    pub fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        self.upsert_if(tenant_id, key, value, |_| Ok(()))
    }

    /// Insert or replace, but only when `check` accepts the current value.
    /// The check and the write happen under one lock.
    pub fn upsert_if(
        &self,
        tenant_id: TenantId,
        key: K,
        value: V,
        check: impl FnOnce(Option<&V>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let slot = (tenant_id, key);
        check(map.get(&slot))?;
        map.insert(slot, value);
        Ok(())
    }

    pub fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .iter()
            .filter_map(|((t, _k), v)| if *t == tenant_id { Some(v.clone()) } else { None })
            .collect())
    }

    /// First value of the tenant matching `predicate`.
    pub fn find(
        &self,
        tenant_id: TenantId,
        predicate: impl Fn(&V) -> bool,
    ) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .iter()
            .find(|((t, _k), v)| *t == tenant_id && predicate(v))
            .map(|(_, v)| v.clone()))
    }
}
