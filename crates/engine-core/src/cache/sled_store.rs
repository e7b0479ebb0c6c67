use super::{CacheEntry, CacheKind, ProgressCache};
use crate::error::CacheError;
use async_trait::async_trait;
use model::{connector::Connector, progress::meta::Meta};
use std::path::Path;

/// Durable cache on sled.
///
/// Meta entries are bincode-encoded under `meta:<id>`. Connector entries are
/// stored as JSON under `conn:<id>` because their config is internally tagged.
#[derive(Clone)]
pub struct SledProgressCache {
    db: sled::Db,
}

impl SledProgressCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn prefix(kind: CacheKind) -> &'static str {
        match kind {
            CacheKind::Meta => "meta:",
            CacheKind::Connector => "conn:",
        }
    }

    #[inline]
    fn key(kind: CacheKind, id: &str) -> String {
        format!("{}{}", Self::prefix(kind), id)
    }

    fn decode(kind: CacheKind, bytes: &[u8]) -> Result<CacheEntry, CacheError> {
        Ok(match kind {
            CacheKind::Meta => CacheEntry::Meta(bincode::deserialize::<Meta>(bytes)?),
            CacheKind::Connector => {
                CacheEntry::Connector(serde_json::from_slice::<Connector>(bytes)?)
            }
        })
    }

    fn encode(entry: &CacheEntry) -> Result<Vec<u8>, CacheError> {
        Ok(match entry {
            CacheEntry::Meta(meta) => bincode::serialize(meta)?,
            CacheEntry::Connector(connector) => serde_json::to_vec(connector)?,
        })
    }
}

#[async_trait]
impl ProgressCache for SledProgressCache {
    async fn get(&self, key: &str, kind: CacheKind) -> Result<Option<CacheEntry>, CacheError> {
        match self.db.get(Self::key(kind, key))? {
            Some(bytes) => Ok(Some(Self::decode(kind, &bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let bytes = Self::encode(&entry)?;
        self.db.insert(Self::key(entry.kind(), key), bytes)?;
        // Progress is write-through: a crash may lose at most the current page.
        self.db.flush_async().await?;
        Ok(())
    }

    async fn remove(&self, key: &str, kind: CacheKind) -> Result<bool, CacheError> {
        let removed = self.db.remove(Self::key(kind, key))?.is_some();
        self.db.flush_async().await?;
        Ok(removed)
    }

    async fn keys(&self, kind: CacheKind) -> Result<Vec<String>, CacheError> {
        let prefix = Self::prefix(kind);
        let mut keys = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (key, _) = item?;
            if let Some(id) = String::from_utf8_lossy(&key).strip_prefix(prefix) {
                keys.push(id.to_string());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        connector::{Connector, ConnectorConfig},
        progress::meta::MetaState,
    };
    use tempfile::tempdir;

    #[tokio::test]
    async fn meta_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let cache = SledProgressCache::open(dir.path()).unwrap();
            let mut meta = Meta::new("job-meta");
            meta.state = MetaState::Running;
            meta.set_page_index(4);
            meta.record(300, 2);
            cache.put_meta(&meta).await.unwrap();
        }

        let cache = SledProgressCache::open(dir.path()).unwrap();
        let meta = cache.meta("job-meta").await.unwrap().unwrap();
        assert_eq!(meta.page_index(), 4);
        assert_eq!((meta.success, meta.failure), (300, 2));
        assert_eq!(meta.state, MetaState::Running);
    }

    #[tokio::test]
    async fn connector_config_keeps_its_variant() {
        let dir = tempdir().unwrap();
        let cache = SledProgressCache::open(dir.path()).unwrap();
        let connector = Connector::new("out", ConnectorConfig::json_file("/data/out"));

        cache.put_connector(&connector).await.unwrap();

        assert_eq!(cache.connector("out").await.unwrap(), Some(connector));
        assert_eq!(cache.keys(CacheKind::Connector).await.unwrap(), vec!["out"]);
        assert!(cache.keys(CacheKind::Meta).await.unwrap().is_empty());
        assert!(cache.remove("out", CacheKind::Connector).await.unwrap());
        assert!(!cache.remove("out", CacheKind::Connector).await.unwrap());
    }
}
