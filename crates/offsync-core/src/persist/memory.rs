use async_trait::async_trait;
use dashmap::DashMap;

use super::KvError;
use crate::source::KeyValueStore;

/// Non-persistent store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), KvError> {
        self.entries.insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, KvError> {
        Ok(self.entries.iter().map(|r| r.key().clone()).collect())
    }
}
