mod file_store;
mod memory;

use std::path::PathBuf;

pub use file_store::{FileDurableStore, DEFAULT_SESSION_FILE};
pub use memory::InMemoryDurableStore;

const APP_DIR_NAME: &str = "onboard";

/// Platform data directory for the session file, e.g.
/// `~/.local/share/onboard` on Linux.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow::anyhow!("no platform data directory available"))
}
