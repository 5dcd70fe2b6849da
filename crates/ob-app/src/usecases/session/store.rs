//! Session store.
//!
//! Holds the current [`Session`], persists it through the
//! [`DurableStorePort`], and publishes a [`SessionEvent`] for every change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, info_span, warn, Instrument};

use ob_core::ports::DurableStorePort;
use ob_core::session::{
    is_onboarding_complete, keys, Identity, Session, SessionToken, ThemePreference,
};

use super::events::SessionEvent;
use crate::usecases::context::StateContext;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Non-fatal: the new state is live in memory and was published, but
    /// the durable write failed. It will not survive a restart.
    #[error("session change kept in memory only: {message}")]
    PersistenceWriteFailure {
        session: Box<Session>,
        message: String,
    },

    #[error("no signed-in session")]
    NotSignedIn,
}

impl SessionError {
    /// The in-memory session a persistence failure left in effect.
    pub fn into_session(self) -> Option<Session> {
        match self {
            SessionError::PersistenceWriteFailure { session, .. } => Some(*session),
            SessionError::NotSignedIn => None,
        }
    }
}

/// Single writer of the session and of its durable keys.
///
/// Every mutation runs under the dispatch lock: the durable write is awaited
/// first, then the in-memory state is replaced and a [`SessionEvent`] is
/// published. A failed write still moves the in-memory state forward.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use ob_app::{SessionEvent, SessionStore};
/// use ob_core::session::{Identity, SessionToken, ThemePreference};
/// use ob_infra::InMemoryDurableStore;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let store = SessionStore::new(Arc::new(InMemoryDurableStore::new()));
/// let mut events = store.subscribe().await;
///
/// let session = store
///     .login(
///         SessionToken::new("jwt"),
///         Identity::new("u1", "Ada", "ada@example.com"),
///         ThemePreference::Light,
///     )
///     .await?;
///
/// assert!(session.is_signed_in());
/// assert!(!session.onboarding_complete());
/// assert!(matches!(events.recv().await, Some(SessionEvent::SignedIn(_))));
/// # Ok(())
/// # }
/// ```
pub struct SessionStore {
    durable: Arc<dyn DurableStorePort>,
    context: StateContext<Session>,
    restored: AtomicBool,
    event_senders: Mutex<Vec<mpsc::Sender<SessionEvent>>>,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn DurableStorePort>) -> Self {
        Self {
            durable,
            context: StateContext::new(Session::default()),
            restored: AtomicBool::new(false),
            event_senders: Mutex::new(Vec::new()),
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.context.get_state().await
    }

    /// Receive every subsequent session change.
    ///
    /// Events are delivered without back-pressure. A receiver that falls more
    /// than the channel capacity behind misses events; a dropped receiver is
    /// forgotten on the next publish.
    pub async fn subscribe(&self) -> mpsc::Receiver<SessionEvent> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.event_senders.lock().await.push(event_tx);
        event_rx
    }

    /// Load the persisted session. Runs once per store; later calls (and calls
    /// after a login/logout already happened) return the current snapshot.
    ///
    /// Never fails: unreadable or inconsistent storage yields a signed-out
    /// session.
    pub async fn restore(&self) -> Session {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        if self.restored.swap(true, Ordering::SeqCst) {
            return self.context.get_state().await;
        }

        let session = self
            .read_persisted()
            .instrument(info_span!("usecase.session_store.restore"))
            .await;
        info!(
            signed_in = session.is_signed_in(),
            onboarding_complete = session.onboarding_complete(),
            "session restored"
        );
        self.context.set_state(session.clone()).await;
        self.emit(SessionEvent::Restored(session.clone())).await;
        session
    }

    /// The only path from signed out to signed in.
    ///
    /// Writes all four session keys in one `set_many`. The onboarding flag is
    /// derived from the identity's answers.
    ///
    /// # Errors
    ///
    /// [`SessionError::PersistenceWriteFailure`] when the durable write
    /// failed. The session is signed in for this run regardless; use
    /// [`SessionError::into_session`] to get it.
    pub async fn login(
        &self,
        token: SessionToken,
        identity: Identity,
        theme: ThemePreference,
    ) -> Result<Session, SessionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        self.restored.store(true, Ordering::SeqCst);

        let onboarding_complete = is_onboarding_complete(&identity);
        let persisted = match serde_json::to_string(&identity) {
            Ok(identity_json) => {
                let pairs = [
                    (keys::TOKEN, token.expose().to_string()),
                    (keys::IDENTITY, identity_json),
                    (keys::THEME, theme.as_str().to_string()),
                    (keys::ONBOARDING_COMPLETE, keys::encode_flag(onboarding_complete)),
                ];
                self.durable.set_many(&pairs).await
            }
            Err(err) => Err(anyhow::Error::new(err).context("serialize identity failed")),
        };

        let session = Session::signed_in(token, identity, theme, onboarding_complete);
        info!(
            user_id = ?session.user_id(),
            onboarding_complete,
            "session signed in"
        );
        self.commit(session, SessionEvent::SignedIn, persisted, "login")
            .await
    }

    /// Clear everything. Safe to call when already signed out.
    ///
    /// The theme falls back to its default along with the other keys.
    ///
    /// # Errors
    ///
    /// [`SessionError::PersistenceWriteFailure`] when the keys could not be
    /// removed. The in-memory session is signed out regardless.
    pub async fn logout(&self) -> Result<Session, SessionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        self.restored.store(true, Ordering::SeqCst);

        let persisted = self.durable.remove_many(&keys::ALL).await;
        info!("session signed out");
        self.commit(
            Session::signed_out(ThemePreference::default()),
            SessionEvent::SignedOut,
            persisted,
            "logout",
        )
        .await
    }

    pub async fn set_theme_preference(
        &self,
        theme: ThemePreference,
    ) -> Result<Session, SessionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let session = self.context.get_state().await.with_theme(theme);
        let persisted = self.durable.set(keys::THEME, theme.as_str()).await;
        debug!(theme = theme.as_str(), "theme preference updated");
        self.commit(session, SessionEvent::ThemeChanged, persisted, "set_theme")
            .await
    }

    pub async fn set_onboarding_complete(&self, value: bool) -> Result<Session, SessionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let session = self
            .context
            .get_state()
            .await
            .with_onboarding_complete(value);
        let persisted = self
            .durable
            .set(keys::ONBOARDING_COMPLETE, &keys::encode_flag(value))
            .await;
        debug!(value, "onboarding flag updated");
        self.commit(
            session,
            SessionEvent::OnboardingChanged,
            persisted,
            "set_onboarding_complete",
        )
        .await
    }

    /// Install the identity returned by the profile-setup call and mark
    /// onboarding done, in one durable write.
    pub async fn complete_onboarding(&self, identity: Identity) -> Result<Session, SessionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let current = self.context.get_state().await;
        if !current.is_signed_in() {
            return Err(SessionError::NotSignedIn);
        }

        let persisted = match serde_json::to_string(&identity) {
            Ok(identity_json) => {
                let pairs = [
                    (keys::IDENTITY, identity_json),
                    (keys::ONBOARDING_COMPLETE, keys::encode_flag(true)),
                ];
                self.durable.set_many(&pairs).await
            }
            Err(err) => Err(anyhow::Error::new(err).context("serialize identity failed")),
        };

        let session = current
            .with_identity(identity)
            .with_onboarding_complete(true);
        info!(user_id = ?session.user_id(), "onboarding completed");
        self.commit(
            session,
            SessionEvent::OnboardingChanged,
            persisted,
            "complete_onboarding",
        )
        .await
    }

    /// Replace the identity wholesale (profile refresh). Token and flags stay.
    pub async fn replace_identity(&self, identity: Identity) -> Result<Session, SessionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let current = self.context.get_state().await;
        if !current.is_signed_in() {
            return Err(SessionError::NotSignedIn);
        }

        let persisted = match serde_json::to_string(&identity) {
            Ok(identity_json) => self.durable.set(keys::IDENTITY, &identity_json).await,
            Err(err) => Err(anyhow::Error::new(err).context("serialize identity failed")),
        };

        let session = current.with_identity(identity);
        self.commit(
            session,
            SessionEvent::IdentityUpdated,
            persisted,
            "replace_identity",
        )
        .await
    }

    /// Apply the new state and publish it, then report the durable write result.
    ///
    /// Must be called while holding the dispatch lock.
    async fn commit(
        &self,
        session: Session,
        event: fn(Session) -> SessionEvent,
        persisted: anyhow::Result<()>,
        operation: &'static str,
    ) -> Result<Session, SessionError> {
        self.context.set_state(session.clone()).await;
        self.emit(event(session.clone())).await;

        match persisted {
            Ok(()) => Ok(session),
            Err(err) => {
                let message = format!("{err:#}");
                warn!(operation, error = %message, "session persistence write failed");
                self.emit(SessionEvent::PersistenceFailed {
                    operation,
                    message: message.clone(),
                })
                .await;
                Err(SessionError::PersistenceWriteFailure {
                    session: Box::new(session),
                    message,
                })
            }
        }
    }

    async fn read_persisted(&self) -> Session {
        let token = self.read_key(keys::TOKEN).await;
        let identity_json = self.read_key(keys::IDENTITY).await;
        let theme = self
            .read_key(keys::THEME)
            .await
            .and_then(|raw| match raw.parse::<ThemePreference>() {
                Ok(theme) => Some(theme),
                Err(err) => {
                    warn!(error = %err, "ignoring stored theme preference");
                    None
                }
            })
            .unwrap_or_default();
        let stored_flag = self
            .read_key(keys::ONBOARDING_COMPLETE)
            .await
            .and_then(|raw| keys::decode_flag(&raw));

        let (Some(token), Some(identity_json)) = (token, identity_json) else {
            return Session::signed_out(theme);
        };

        match serde_json::from_str::<Identity>(&identity_json) {
            Ok(identity) => {
                let onboarding_complete =
                    stored_flag.unwrap_or_else(|| is_onboarding_complete(&identity));
                Session::signed_in(
                    SessionToken::new(token),
                    identity,
                    theme,
                    onboarding_complete,
                )
            }
            Err(err) => {
                warn!(error = %err, "stored identity is unreadable, starting signed out");
                Session::signed_out(theme)
            }
        }
    }

    /// Read failures count as absent.
    async fn read_key(&self, key: &str) -> Option<String> {
        match self.durable.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(key, error = %err, "durable store read failed, treating as absent");
                None
            }
        }
    }

    /// Fan `event` out without waiting on receivers. A subscriber whose
    /// buffer is full misses this event; closed subscribers are dropped.
    async fn emit(&self, event: SessionEvent) {
        let mut senders = self.event_senders.lock().await;
        senders.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    capacity = EVENT_CHANNEL_CAPACITY,
                    "session event subscriber is not keeping up, event dropped"
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("session event receiver dropped");
                false
            }
        });
    }
}
