//!
//! adminauth storage module
//! ------------------------
//! Client-local durable storage: a synchronous key/value slot store. The session layer
//! keeps exactly one slot (`auth` by default) in it. Two backends are provided:
//!
//! - [`MemoryStorage`]: process-lifetime map, used by tests and embedded hosts.
//! - [`FileStorage`]: one JSON document on disk, survives restarts ("page reloads").
//!
//! Every write replaces a whole value; readers never observe a partially written slot.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::AuthResult;

mod file;

pub use file::FileStorage;

/// Default key of the session slot.
pub const AUTH_KEY: &str = "auth";

/// Synchronous key/value slot store.
pub trait SlotStore: Send + Sync {
    fn get(&self, key: &str) -> AuthResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AuthResult<()>;
    fn remove(&self, key: &str) -> AuthResult<()>;
}

pub type SharedSlots = Arc<dyn SlotStore>;

/// In-memory slot store.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    map: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
}

impl SlotStore for MemoryStorage {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        self.map.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
