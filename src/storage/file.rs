use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::SlotStore;
use crate::error::AuthResult;

/// File-backed slot store: a single pretty-printed JSON object of `key -> value`.
/// The document is cached in memory and rewritten through a temp file + rename on every change;
/// the cache only takes a change once it is on disk.
pub struct FileStorage {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`. A missing file is an empty store;
    /// an unreadable document is logged and treated as empty.
    pub fn open(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        let map = if path.exists() {
            let bytes = std::fs::read(&path)?;
            match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(target: "adminauth::storage", "ignoring unreadable slot file {}: {}", path.display(), e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        debug!(target: "adminauth::storage", "opened slot file {} ({} keys)", path.display(), map.len());
        Ok(Self { path, map: RwLock::new(map) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, map: &HashMap<String, String>) -> AuthResult<()> {
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl SlotStore for FileStorage {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let mut w = self.map.write();
        let mut next = w.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *w = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        let mut w = self.map.write();
        if !w.contains_key(key) { return Ok(()); }
        let mut next = w.clone();
        next.remove(key);
        self.flush(&next)?;
        *w = next;
        Ok(())
    }
}
