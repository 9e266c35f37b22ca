//! Per-scope file → content hash map, persisted as JSON next to the scope
//! database.

use super::IndexError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const HASH_CACHE_FILE: &str = "file_hashes.json";

/// First 16 hex characters of the SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug)]
pub struct FileHashCache {
    path: PathBuf,
    hashes: BTreeMap<String, String>,
}

impl FileHashCache {
    /// Load the cache at `path`. A missing or unreadable file gives an empty
    /// cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let hashes = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("Discarding corrupt hash cache {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, hashes }
    }

    /// Write the cache through a temporary file.
    pub fn save(&self) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(&self.hashes)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.hashes.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: String, hash: String) {
        self.hashes.insert(key, hash);
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.hashes.remove(key)
    }

    /// Keys starting with `prefix`.
    pub fn keys_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.hashes
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(move |k| k.starts_with(prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn clear(&mut self) {
        self.hashes.clear();
    }
}
