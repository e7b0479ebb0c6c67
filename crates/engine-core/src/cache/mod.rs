//! Keyed store for job progress and connector snapshots.

use crate::error::CacheError;
use async_trait::async_trait;
use model::{connector::Connector, progress::meta::Meta};

pub mod memory;
pub mod sled_store;

pub use memory::MemoryProgressCache;
pub use sled_store::SledProgressCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Meta,
    Connector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Meta(Meta),
    Connector(Connector),
}

impl CacheEntry {
    pub fn kind(&self) -> CacheKind {
        match self {
            CacheEntry::Meta(_) => CacheKind::Meta,
            CacheEntry::Connector(_) => CacheKind::Connector,
        }
    }
}

/// Every read returns an owned copy; callers mutate it and `put` it back.
#[async_trait]
pub trait ProgressCache: Send + Sync {
    async fn get(&self, key: &str, kind: CacheKind) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    /// Returns whether an entry was removed.
    async fn remove(&self, key: &str, kind: CacheKind) -> Result<bool, CacheError>;

    async fn keys(&self, kind: CacheKind) -> Result<Vec<String>, CacheError>;

    async fn meta(&self, id: &str) -> Result<Option<Meta>, CacheError> {
        match self.get(id, CacheKind::Meta).await? {
            Some(CacheEntry::Meta(meta)) => Ok(Some(meta)),
            Some(_) => Err(CacheError::WrongKind {
                key: id.to_string(),
                expected: CacheKind::Meta,
            }),
            None => Ok(None),
        }
    }

    async fn put_meta(&self, meta: &Meta) -> Result<(), CacheError> {
        self.put(&meta.id, CacheEntry::Meta(meta.clone())).await
    }

    async fn connector(&self, id: &str) -> Result<Option<Connector>, CacheError> {
        match self.get(id, CacheKind::Connector).await? {
            Some(CacheEntry::Connector(connector)) => Ok(Some(connector)),
            Some(_) => Err(CacheError::WrongKind {
                key: id.to_string(),
                expected: CacheKind::Connector,
            }),
            None => Ok(None),
        }
    }

    async fn put_connector(&self, connector: &Connector) -> Result<(), CacheError> {
        self.put(&connector.id, CacheEntry::Connector(connector.clone()))
            .await
    }
}
