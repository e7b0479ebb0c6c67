use super::{CacheEntry, CacheKind, ProgressCache};
use crate::error::CacheError;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Process-local cache, used by tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressCache {
    entries: Arc<RwLock<HashMap<(CacheKind, String), CacheEntry>>>,
}

impl MemoryProgressCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressCache for MemoryProgressCache {
    async fn get(&self, key: &str, kind: CacheKind) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self
            .entries
            .read()
            .await
            .get(&(kind, key.to_string()))
            .cloned())
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert((entry.kind(), key.to_string()), entry);
        Ok(())
    }

    async fn remove(&self, key: &str, kind: CacheKind) -> Result<bool, CacheError> {
        Ok(self
            .entries
            .write()
            .await
            .remove(&(kind, key.to_string()))
            .is_some())
    }

    async fn keys(&self, kind: CacheKind) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        connector::{Connector, ConnectorConfig},
        progress::meta::Meta,
    };

    #[tokio::test]
    async fn kinds_do_not_collide() {
        let cache = MemoryProgressCache::new();
        cache.put_meta(&Meta::new("same")).await.unwrap();
        cache
            .put_connector(&Connector::new("same", ConnectorConfig::memory("ds")))
            .await
            .unwrap();

        assert_eq!(cache.meta("same").await.unwrap().unwrap().id, "same");
        assert!(cache.connector("same").await.unwrap().is_some());
        assert!(cache.remove("same", CacheKind::Meta).await.unwrap());
        assert!(cache.meta("same").await.unwrap().is_none());
        assert_eq!(cache.keys(CacheKind::Connector).await.unwrap(), vec!["same"]);
    }

    #[tokio::test]
    async fn reads_are_copies() {
        let cache = MemoryProgressCache::new();
        cache.put_meta(&Meta::new("m")).await.unwrap();

        let mut copy = cache.meta("m").await.unwrap().unwrap();
        copy.record(10, 0);

        assert_eq!(cache.meta("m").await.unwrap().unwrap().success, 0);
    }
}
