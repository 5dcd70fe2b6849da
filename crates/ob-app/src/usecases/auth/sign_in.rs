use std::sync::Arc;

use tracing::{info, warn};

use ob_core::auth::{AuthError, AuthGrant, PasswordCredentials};
use ob_core::ports::AuthBackendPort;
use ob_core::session::Session;

use super::{CredentialVerifier, PasswordVerifier};
use crate::usecases::session::SessionStore;

/// Where a freshly established session should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub session: Session,
    /// Route through the questionnaire before anything else.
    pub needs_onboarding: bool,
}

/// Hands verified grants to the session store.
pub struct SignIn {
    password: PasswordVerifier,
    store: Arc<SessionStore>,
}

impl SignIn {
    pub fn new(backend: Arc<dyn AuthBackendPort>, store: Arc<SessionStore>) -> Self {
        Self {
            password: PasswordVerifier::new(backend),
            store,
        }
    }

    pub async fn with_password(
        &self,
        credentials: PasswordCredentials,
    ) -> Result<SignInOutcome, AuthError> {
        let grant = self.password.verify(credentials).await?;
        Ok(self.establish(grant).await)
    }

    /// Log the grant in, keeping the current theme preference.
    ///
    /// A failed durable write does not undo the sign-in; the session stays
    /// live for this run.
    pub async fn establish(&self, grant: AuthGrant) -> SignInOutcome {
        let theme = self.store.snapshot().await.theme();
        let session = match self.store.login(grant.token, grant.identity, theme).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "session established without persistence");
                match err.into_session() {
                    Some(session) => session,
                    None => self.store.snapshot().await,
                }
            }
        };

        let needs_onboarding = !session.onboarding_complete();
        info!(user_id = ?session.user_id(), needs_onboarding, "signed in");
        SignInOutcome {
            session,
            needs_onboarding,
        }
    }
}
