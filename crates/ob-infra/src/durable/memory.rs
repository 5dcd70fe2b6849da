use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ob_core::ports::DurableStorePort;

/// Process-lifetime store. Nothing survives a restart unless the same
/// instance is shared.
///
/// Multi-key writes take the write lock once, so concurrent readers never
/// observe half of a `set_many` or `remove_many`.
///
/// # Examples
///
/// ```
/// use ob_core::ports::DurableStorePort;
/// use ob_infra::InMemoryDurableStore;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let store = InMemoryDurableStore::new();
/// store
///     .set_many(&[("token", "abc".to_string()), ("theme", "light".to_string())])
///     .await?;
/// store.remove_many(&["token"]).await?;
/// assert_eq!(store.len().await, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct InMemoryDurableStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl DurableStorePort for InMemoryDurableStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, pairs: &[(&str, String)]) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        for (key, value) in pairs {
            values.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
