use async_trait::async_trait;

use crate::deferred::PendingAction;
use crate::session::Session;

/// Runs a protected action once a usable session exists.
#[async_trait]
pub trait ActionExecutorPort: Send + Sync {
    async fn execute(&self, action: &PendingAction, session: &Session) -> anyhow::Result<()>;
}
