use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use super::KvError;
use crate::source::KeyValueStore;

const EXTENSION: &str = "kv";

/// One file per key under a directory.
///
/// Cache keys carry JSON and can be arbitrarily long, so files are named
/// by a stable 64-bit FNV-1a hash of the key and the key itself is stored
/// in a length-prefixed header. Reads verify the header, so a hash
/// collision reads as absent instead of returning a foreign value.
/// Writes go to a temporary file and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KvError> {
        if key.is_empty() {
            return Err(KvError::InvalidKey("empty key".into()));
        }
        Ok(self.dir.join(format!("{:016x}.{EXTENSION}", fnv1a(key.as_bytes()))))
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let path = self.path_for(key)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match split_entry(&raw) {
            Some((stored_key, value)) if stored_key == key => Ok(Some(value.to_vec())),
            Some(_) => {
                warn!(key, path = %path.display(), "hash collision in file store");
                Ok(None)
            }
            None => {
                warn!(key, path = %path.display(), "corrupt entry in file store");
                Ok(None)
            }
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        let key_len = u32::try_from(key.len())
            .map_err(|_| KvError::InvalidKey("key longer than 4 GiB".into()))?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut entry = Vec::with_capacity(4 + key.len() + bytes.len());
        entry.extend_from_slice(&key_len.to_le_bytes());
        entry.extend_from_slice(key.as_bytes());
        entry.extend_from_slice(bytes);

        // Unique per write: concurrent writers to one key must not share a
        // temp file. The last rename wins.
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = write_then_rename(&tmp, &path, &entry).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(key, size = bytes.len(), "persisted value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, KvError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let raw = match tokio::fs::read(&path).await {
                Ok(raw) => raw,
                // Removed between listing and reading.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if let Some((key, _)) = split_entry(&raw) {
                keys.push(key.to_owned());
            }
        }
        Ok(keys)
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, entry: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, entry).await?;
    tokio::fs::rename(tmp, path).await
}

/// Split a stored entry into `(key, value)`.
fn split_entry(raw: &[u8]) -> Option<(&str, &[u8])> {
    let (len, rest) = raw.split_first_chunk::<4>()?;
    let len = usize::try_from(u32::from_le_bytes(*len)).ok()?;
    if rest.len() < len {
        return None;
    }
    let (key, value) = rest.split_at(len);
    Some((std::str::from_utf8(key).ok()?, value))
}

/// 64-bit FNV-1a. Stable across platforms and toolchains, unlike
/// `DefaultHasher`, which matters for names that outlive the process.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}
