//! Local durable draft slot (port)

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::MenuError;

#[async_trait]
pub trait DraftStorage: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, MenuError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), MenuError>;
}

/// Process-local draft slots.
#[derive(Debug, Default)]
pub struct MemoryDraftStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryDraftStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.slots.read().get(key).cloned()
    }
}

#[async_trait]
impl DraftStorage for MemoryDraftStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, MenuError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), MenuError> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
