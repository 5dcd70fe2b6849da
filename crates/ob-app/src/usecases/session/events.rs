use ob_core::session::Session;

/// Published by [`super::SessionStore`] after each mutation's durable write
/// completed (or failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Restored(Session),
    SignedIn(Session),
    SignedOut(Session),
    ThemeChanged(Session),
    OnboardingChanged(Session),
    IdentityUpdated(Session),
    /// Diagnostic: the in-memory state moved on but could not be stored.
    PersistenceFailed {
        operation: &'static str,
        message: String,
    },
}

impl SessionEvent {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionEvent::Restored(session)
            | SessionEvent::SignedIn(session)
            | SessionEvent::SignedOut(session)
            | SessionEvent::ThemeChanged(session)
            | SessionEvent::OnboardingChanged(session)
            | SessionEvent::IdentityUpdated(session) => Some(session),
            SessionEvent::PersistenceFailed { .. } => None,
        }
    }
}
