use crate::domain::ports::Store;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store. Seeds are served for keys that were never written.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Vec<Value>>>,
    seeds: HashMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, key: &str, values: Vec<Value>) -> Self {
        self.seeds.insert(key.to_string(), values);
        self
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<Value>> {
        let values = self.values.read().await;
        Ok(values
            .get(key)
            .or_else(|| self.seeds.get(key))
            .cloned()
            .unwrap_or_default())
    }

    async fn replace(&self, key: &str, values: Vec<Value>) -> Result<()> {
        let mut stored = self.values.write().await;
        stored.insert(key.to_string(), values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unset_key_is_empty() {
        let store = MemoryStore::new();
        assert!(store.get("groups").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_until_first_write() {
        let store = MemoryStore::new().with_seed("attendees", vec![json!("Alice")]);

        assert_eq!(store.get("attendees").await.unwrap(), vec![json!("Alice")]);

        store.replace("attendees", vec![]).await.unwrap();
        assert!(store.get("attendees").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryStore::new();
        store.replace("attendees", vec![json!("Bob")]).await.unwrap();
        store
            .replace("groups", vec![json!({"group_id": 1, "members": []})])
            .await
            .unwrap();

        assert_eq!(store.get("attendees").await.unwrap(), vec![json!("Bob")]);
        assert_eq!(store.get("groups").await.unwrap().len(), 1);
    }
}
