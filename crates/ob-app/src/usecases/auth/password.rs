//! Email and password verification.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info_span, warn, Instrument};

use ob_core::auth::{AuthError, AuthGrant, BackendError, PasswordCredentials};
use ob_core::ports::AuthBackendPort;

use super::CredentialVerifier;

pub struct PasswordVerifier {
    backend: Arc<dyn AuthBackendPort>,
}

impl PasswordVerifier {
    pub fn new(backend: Arc<dyn AuthBackendPort>) -> Self {
        Self { backend }
    }
}

/// 401/403 and any other client rejection mean the credentials were refused;
/// everything else is treated as a connectivity problem.
pub(crate) fn login_error(err: BackendError) -> AuthError {
    match err {
        BackendError::Unauthorized => AuthError::InvalidCredentials,
        BackendError::Rejected { status, .. } if (400..500).contains(&status) => {
            AuthError::InvalidCredentials
        }
        other => AuthError::network(other),
    }
}

#[async_trait]
impl CredentialVerifier for PasswordVerifier {
    type Proof = PasswordCredentials;

    async fn verify(&self, proof: PasswordCredentials) -> Result<AuthGrant, AuthError> {
        let span = info_span!("usecase.password_verifier.verify");

        async {
            let email = proof.email.trim();
            let grant = self
                .backend
                .login(email, &proof.password, proof.push_token.as_deref())
                .await
                .map_err(|err| {
                    warn!(error = %err, "password login refused");
                    login_error(err)
                })?;
            debug!(user_id = %grant.identity.id, "password login accepted");
            Ok(grant)
        }
        .instrument(span)
        .await
    }
}
