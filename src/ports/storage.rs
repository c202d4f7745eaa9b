//! Storage port
//!
//! Flat key-value persistence in the shape of a mobile async storage API.
//! Single-key writes must be atomic; nothing is transactional across keys.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StorageError;

/// Key-value persistence consumed by the cache and the action queue.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the stored bytes, or `None` if the key is absent.
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored.
    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Removes every key in `keys`.
    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            self.remove_item(key).await?;
        }
        Ok(())
    }
}

// == Memory Storage ==
/// In-process storage with an optional byte quota.
///
/// The quota counts value bytes only and makes it possible to exercise the
/// "device storage full" path without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, Vec<u8>>>,
    quota: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that refuses writes once `limit` value bytes are in use.
    pub fn with_quota(limit: u64) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota: Some(limit),
        }
    }

    /// Total bytes currently held.
    pub async fn used_bytes(&self) -> u64 {
        self.items
            .read()
            .await
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut items = self.items.write().await;

        if let Some(limit) = self.quota {
            let current: u64 = items.values().map(|v| v.len() as u64).sum();
            let replaced = items.get(key).map(|v| v.len() as u64).unwrap_or(0);
            let used = current - replaced + value.len() as u64;
            if used > limit {
                return Err(StorageError::QuotaExceeded { used, limit });
            }
        }

        items.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.read().await.keys().cloned().collect())
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }
}

// == File Storage ==
/// One file per key under a root directory.
///
/// File names are the SHA-256 of the key in hex, so every name has the same
/// length however long the key is. Each file starts with a header holding
/// the key itself (4-byte big-endian length, then the UTF-8 bytes), which is
/// where `get_all_keys` recovers logical keys from.
///
/// Writes go to a temp file that is flushed to disk and then renamed over
/// the target, so a crash never exposes a partial record.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

const RECORD_EXT: &str = "rec";
const TEMP_EXT: &str = "tmp";
const HEADER_LEN: usize = 4;

impl FileStorage {
    /// Opens (and creates if needed) a storage rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Io {
                key: root.display().to_string(),
                source,
            })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str, ext: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.{}", hex::encode(digest), ext))
    }

    /// Reads only the key header of a record file.
    async fn read_key(path: &Path) -> std::io::Result<String> {
        let mut file = fs::File::open(path).await?;
        let mut len = [0u8; HEADER_LEN];
        file.read_exact(&mut len).await?;
        let mut key = vec![0u8; u32::from_be_bytes(len) as usize];
        file.read_exact(&mut key).await?;
        String::from_utf8(key).map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

fn encode_record(key: &str, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + key.len() + value.len());
    buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(value);
    buf
}

/// Splits a record file into its stored key and value.
fn decode_record(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let len: [u8; HEADER_LEN] = bytes.get(..HEADER_LEN)?.try_into().ok()?;
    let end = HEADER_LEN.checked_add(u32::from_be_bytes(len) as usize)?;
    let key = bytes.get(HEADER_LEN..end)?;
    Some((key, &bytes[end..]))
}

/// Writes `bytes` to `tmp`, syncs it and renames it to `target`.
async fn write_atomically(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp, target).await
}

#[async_trait]
impl Storage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let bytes = match fs::read(self.path_for(key, RECORD_EXT)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(key)(e)),
        };

        match decode_record(&bytes) {
            Some((stored, value)) if stored == key.as_bytes() => Ok(Some(value.to_vec())),
            // Digest collision: the file belongs to another key
            Some(_) => Ok(None),
            None => Err(io_error(key)(std::io::Error::new(
                ErrorKind::InvalidData,
                "truncated record header",
            ))),
        }
    }

    async fn set_item(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let tmp = self.path_for(key, TEMP_EXT);
        let target = self.path_for(key, RECORD_EXT);

        if let Err(e) = write_atomically(&tmp, &target, &encode_record(key, &value)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(key)(e));
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key, RECORD_EXT)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        let root = self.root.display().to_string();
        let mut dir = fs::read_dir(&self.root).await.map_err(io_error(&root))?;
        let mut keys = Vec::new();

        while let Some(entry) = dir.next_entry().await.map_err(io_error(&root))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            match Self::read_key(&path).await {
                Ok(key) => keys.push(key),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        Ok(keys)
    }
}
