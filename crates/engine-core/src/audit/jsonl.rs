use super::AuditStore;
use crate::error::AuditError;
use async_trait::async_trait;
use model::execution::audit::AuditEntry;
use std::path::{Path, PathBuf};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

/// Appends one JSON object per line.
pub struct JsonlAuditStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlAuditStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for JsonlAuditStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        events::EventKind,
        execution::audit::{LogType, MetaLog},
        records::record::Record,
    };
    use tempfile::tempdir;

    #[tokio::test]
    async fn appends_lines() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditStore::open(dir.path().join("audit/audit.jsonl"))
            .await
            .unwrap();

        store
            .append(&AuditEntry::data(
                "m",
                EventKind::Delete,
                false,
                vec![Record::new().with("id", 3)],
                "boom\n",
            ))
            .await
            .unwrap();
        store
            .append(&AuditEntry::log(LogType::Meta(MetaLog::Task), "done"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "DELETE");
        assert_eq!(lines[0]["records"][0]["id"], 3);
        assert_eq!(lines[1]["log_type"]["code"], "52");
    }
}
