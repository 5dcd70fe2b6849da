//! Durable key-value store port
//!
//! Survives process restarts. Implementations are provided by the
//! infrastructure layer (file-backed, in-memory).

use async_trait::async_trait;

#[async_trait]
pub trait DurableStorePort: Send + Sync {
    /// Read one key. `Ok(None)` when absent.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Write one key.
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Write all pairs as one unit: afterwards either every pair is stored
    /// or the call failed and none of them is.
    async fn set_many(&self, pairs: &[(&str, String)]) -> anyhow::Result<()>;

    /// Remove all keys as one unit. Absent keys are not an error.
    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()>;
}
