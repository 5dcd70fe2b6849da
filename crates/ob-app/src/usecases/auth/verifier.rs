use async_trait::async_trait;
use ob_core::auth::{AuthError, AuthGrant};

/// Turns one kind of proof into a backend-issued grant.
///
/// Implementations hold no state between calls; a failed `verify` can be
/// retried with a fresh proof.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    type Proof: Send;

    async fn verify(&self, proof: Self::Proof) -> Result<AuthGrant, AuthError>;
}
