//! Deferred-action coordinator.
//!
//! Parks one protected action while the user signs in (and, for fresh
//! accounts, finishes onboarding), then replays it exactly once.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};

use ob_core::deferred::PendingAction;
use ob_core::ports::{ActionExecutorPort, NavigationPort};
use ob_core::session::Session;

use crate::usecases::session::{SessionEvent, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Ran immediately against a ready session.
    Executed,
    /// Parked until the session is ready.
    Deferred,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("protected action {kind} failed: {source}")]
    ExecutionFailed {
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub struct DeferredActionCoordinator {
    session: Arc<SessionStore>,
    navigation: Arc<dyn NavigationPort>,
    executor: Arc<dyn ActionExecutorPort>,
    /// Waiting for sign-in.
    pending: Mutex<Option<PendingAction>>,
    /// Signed in, waiting for onboarding to reach `Complete`.
    after_onboarding: Mutex<Option<PendingAction>>,
}

impl DeferredActionCoordinator {
    pub fn new(
        session: Arc<SessionStore>,
        navigation: Arc<dyn NavigationPort>,
        executor: Arc<dyn ActionExecutorPort>,
    ) -> Self {
        Self {
            session,
            navigation,
            executor,
            pending: Mutex::new(None),
            after_onboarding: Mutex::new(None),
        }
    }

    /// Run `action` now if the session is ready, otherwise park it and route
    /// the user to whatever is missing. The latest attempt replaces any
    /// action parked earlier.
    ///
    /// # Returns
    ///
    /// - `Executed` when the session was signed in and onboarded
    /// - `Deferred` when the action was parked; signed-out users are sent to
    ///   authentication, signed-in users without answers to onboarding
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::ExecutionFailed`] when an immediate execution
    /// failed. Nothing is parked in that case.
    pub async fn attempt(&self, action: PendingAction) -> Result<AttemptOutcome, CoordinatorError> {
        let session = self.session.snapshot().await;
        if session.is_ready() {
            self.execute(action, &session).await?;
            return Ok(AttemptOutcome::Executed);
        }

        info!(kind = action.kind(), signed_in = session.is_signed_in(), "deferring protected action");
        if session.is_signed_in() {
            self.pending.lock().await.take();
            *self.after_onboarding.lock().await = Some(action);
            self.navigation.show_onboarding().await;
        } else {
            self.after_onboarding.lock().await.take();
            *self.pending.lock().await = Some(action);
            self.navigation.show_authentication().await;
        }
        Ok(AttemptOutcome::Deferred)
    }

    /// Sign-in finished. The parked action is taken before anything else, so
    /// repeated notifications replay it at most once.
    pub async fn on_session_established(&self) -> Result<(), CoordinatorError> {
        let Some(action) = self.pending.lock().await.take() else {
            return Ok(());
        };

        let session = self.session.snapshot().await;
        if !session.is_signed_in() {
            debug!(kind = action.kind(), "session gone before replay, keeping action parked");
            *self.pending.lock().await = Some(action);
            return Ok(());
        }

        if !session.onboarding_complete() {
            info!(kind = action.kind(), "replay waits for onboarding");
            *self.after_onboarding.lock().await = Some(action);
            self.navigation.show_onboarding().await;
            return Ok(());
        }

        self.execute(action, &session).await
    }

    /// Onboarding reached `Complete`.
    pub async fn on_onboarding_completed(&self) -> Result<(), CoordinatorError> {
        let session = self.session.snapshot().await;
        if !session.is_ready() {
            return Ok(());
        }
        let Some(action) = self.after_onboarding.lock().await.take() else {
            return Ok(());
        };
        self.execute(action, &session).await
    }

    /// Drive the coordinator from session-store events until the store is
    /// dropped.
    pub fn spawn_listener(
        self: Arc<Self>,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        let span = info_span!("usecase.deferred_action_coordinator.listener");
        tokio::spawn(
            async move {
                while let Some(event) = events.recv().await {
                    let result = match event {
                        SessionEvent::SignedIn(_) => self.on_session_established().await,
                        SessionEvent::OnboardingChanged(session) if session.is_ready() => {
                            self.on_onboarding_completed().await
                        }
                        SessionEvent::SignedOut(_) => {
                            if self.after_onboarding.lock().await.take().is_some() {
                                debug!("dropping action that waited on the previous user's onboarding");
                            }
                            Ok(())
                        }
                        _ => Ok(()),
                    };
                    if let Err(err) = result {
                        error!(error = %err, "deferred action replay failed");
                    }
                }
                debug!("session event stream closed");
            }
            .instrument(span),
        )
    }

    pub async fn has_pending(&self) -> bool {
        self.pending.lock().await.is_some() || self.after_onboarding.lock().await.is_some()
    }

    /// A failed replay is reported, never re-queued.
    async fn execute(&self, action: PendingAction, session: &Session) -> Result<(), CoordinatorError> {
        let kind = action.kind();
        match self.executor.execute(&action, session).await {
            Ok(()) => {
                info!(kind, "protected action executed");
                Ok(())
            }
            Err(source) => {
                error!(kind, error = %source, "protected action failed");
                Err(CoordinatorError::ExecutionFailed { kind, source })
            }
        }
    }
}
