use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{ClientError, Result};

/// String key-value store for cached authorizations.
pub trait AuthorizationStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: String) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory [`AuthorizationStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E>(_: E) -> ClientError {
    ClientError::Storage("lock poisoned".to_string())
}

impl AuthorizationStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.items
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
