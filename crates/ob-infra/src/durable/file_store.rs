//! File-backed durable store
//!
//! All keys live in one JSON object. Every write rewrites the whole object
//! through a temp file and a rename, so a multi-key write either lands
//! completely or not at all.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use ob_core::ports::DurableStorePort;

pub const DEFAULT_SESSION_FILE: &str = "session_store.json";

pub struct FileDurableStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileDurableStore {
    /// Creates a store backed by the JSON file at `path`.
    ///
    /// Nothing touches the disk until the first read or write; a missing file
    /// reads as an empty store.
    ///
    /// # Examples
    ///
    /// ```
    /// use ob_core::ports::DurableStorePort;
    /// use ob_infra::FileDurableStore;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = FileDurableStore::new(dir.path().join("session_store.json"));
    /// store.set("theme", "dark").await?;
    /// assert_eq!(store.get("theme").await?.as_deref(), Some("dark"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store for `filename` inside `base_dir`, typically the
    /// configured data directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use ob_infra::{FileDurableStore, DEFAULT_SESSION_FILE};
    ///
    /// let store = FileDurableStore::with_base_dir("/var/lib/onboard", DEFAULT_SESSION_FILE);
    /// assert!(store.path().ends_with("onboard/session_store.json"));
    /// ```
    pub fn with_base_dir(base_dir: impl AsRef<Path>, filename: impl AsRef<Path>) -> Self {
        Self::new(base_dir.as_ref().join(filename))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file content, `None` when the file is missing or blank.
    async fn read_content(&self) -> Result<Option<String>> {
        if !fs::try_exists(&self.path)
            .await
            .with_context(|| format!("stat durable store failed: {}", self.path.display()))?
        {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read durable store failed: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    /// Read the whole key map.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a JSON object of
    /// strings. Callers of [`DurableStorePort::get`] treat that as absent.
    async fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match self.read_content().await? {
            Some(content) => serde_json::from_str(&content)
                .with_context(|| format!("parse durable store failed: {}", self.path.display())),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Create the parent directory of the store file if it is missing.
    ///
    /// # Returns
    ///
    /// `Ok(())` on success, or an error with context
    /// `create durable store dir failed: {dir}`.
    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create durable store dir failed: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Write `map` to a sibling temp file, then rename it over the store file.
    ///
    /// Readers see either the previous content or the complete new content.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the rename landed; `Err` with path context when creating
    /// the directory, writing the temp file or renaming fails.
    async fn atomic_write(&self, map: &BTreeMap<String, String>) -> Result<()> {
        self.ensure_parent_dir().await?;

        let content =
            serde_json::to_string_pretty(map).context("serialize durable store failed")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("write temp durable store failed: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &self.path).await.with_context(|| {
            format!(
                "rename temp durable store to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;
        Ok(())
    }

    /// Read-modify-write of the whole map under the write lock.
    ///
    /// An unparseable file is treated as empty so that the next write
    /// replaces it instead of failing forever.
    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.write_lock.lock().await;
        let mut map = match self.read_content().await? {
            Some(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(err) => {
                    // The rename below replaces the unreadable file.
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "durable store is corrupt, rewriting from empty"
                    );
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        apply(&mut map);
        self.atomic_write(&map).await
    }
}

#[async_trait]
impl DurableStorePort for FileDurableStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn set_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        self.update(|map| {
            for (key, value) in pairs {
                map.insert(key.to_string(), value.clone());
            }
        })
        .await?;
        debug!(keys = pairs.len(), path = %self.path.display(), "durable store written");
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
        .await
    }
}
