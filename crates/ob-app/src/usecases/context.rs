use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Shared state cell plus dispatch lock.
///
/// Used by the session store and the onboarding orchestrator so that every
/// read-transition-persist-publish sequence runs as one unit.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `state`.
/// - `dispatch_lock`: held for a whole mutation, serializes concurrent callers.
/// - `state`: held briefly for reads and for the final write.
pub(crate) struct StateContext<S> {
    state: Arc<Mutex<S>>,
    dispatch_lock: Arc<Mutex<()>>,
}

impl<S: Clone> StateContext<S> {
    pub(crate) fn new(initial_state: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
            dispatch_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current state. Does NOT acquire `dispatch_lock`.
    pub(crate) async fn get_state(&self) -> S {
        self.state.lock().await.clone()
    }

    pub(crate) async fn acquire_dispatch_lock(&self) -> MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Should only be called while holding `dispatch_lock`.
    pub(crate) async fn set_state(&self, state: S) {
        let mut guard = self.state.lock().await;
        *guard = state;
    }
}
