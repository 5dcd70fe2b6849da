//! Federated (Google / Apple) verification.
//!
//! The provider payload is normalized into a [`FederatedAssertion`] before
//! the backend's register-or-login endpoint is called. The endpoint is an
//! idempotent upsert, so repeating the same canonical identity always lands
//! on the same user.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, info_span, warn, Instrument};

use ob_core::auth::{AuthError, AuthGrant, BackendError, FederatedAssertion, ProviderPayload};
use ob_core::ports::{AuthBackendPort, IdentityProviderPort};

use super::sign_in::{SignIn, SignInOutcome};
use super::CredentialVerifier;

pub struct FederatedVerifier {
    backend: Arc<dyn AuthBackendPort>,
}

impl FederatedVerifier {
    pub fn new(backend: Arc<dyn AuthBackendPort>) -> Self {
        Self { backend }
    }
}

fn federated_error(err: BackendError) -> AuthError {
    match err {
        BackendError::Unauthorized => {
            AuthError::ProviderUnavailable("provider assertion was refused".into())
        }
        BackendError::Rejected { status, message } if (400..500).contains(&status) => {
            AuthError::ProviderUnavailable(message)
        }
        other => AuthError::network(other),
    }
}

#[async_trait]
impl CredentialVerifier for FederatedVerifier {
    type Proof = ProviderPayload;

    async fn verify(&self, proof: ProviderPayload) -> Result<AuthGrant, AuthError> {
        let assertion = FederatedAssertion::from_payload(proof)?;
        let span = info_span!(
            "usecase.federated_verifier.verify",
            provider = ?assertion.provider
        );

        async {
            let grant = self
                .backend
                .register_federated(&assertion)
                .await
                .map_err(|err| {
                    warn!(error = %err, "federated register-or-login failed");
                    federated_error(err)
                })?;
            debug!(user_id = %grant.identity.id, "federated identity accepted");
            Ok(grant)
        }
        .instrument(span)
        .await
    }
}

/// Provider consent, verification and session establishment in one call.
pub struct FederatedSignIn {
    provider: Arc<dyn IdentityProviderPort>,
    verifier: FederatedVerifier,
    sign_in: Arc<SignIn>,
}

impl FederatedSignIn {
    pub fn new(
        provider: Arc<dyn IdentityProviderPort>,
        verifier: FederatedVerifier,
        sign_in: Arc<SignIn>,
    ) -> Self {
        Self {
            provider,
            verifier,
            sign_in,
        }
    }

    /// `Ok(None)` when the user dismissed the provider's consent screen.
    pub async fn sign_in(&self) -> Result<Option<SignInOutcome>, AuthError> {
        let payload = match self.provider.request_assertion().await {
            Ok(payload) => payload,
            Err(AuthError::ProviderCancelled) => {
                info!(provider = ?self.provider.provider(), "federated sign-in cancelled");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let grant = self.verifier.verify(payload).await?;
        Ok(Some(self.sign_in.establish(grant).await))
    }
}
