use async_trait::async_trait;

use crate::auth::{AuthError, FederatedProvider, ProviderPayload};

/// A third-party identity provider SDK (consent UI included).
#[async_trait]
pub trait IdentityProviderPort: Send + Sync {
    fn provider(&self) -> FederatedProvider;

    /// Run the provider's consent flow.
    ///
    /// Fails with `ProviderCancelled` when the user dismisses the consent UI
    /// and `ProviderUnavailable` when the SDK cannot run.
    async fn request_assertion(&self) -> Result<ProviderPayload, AuthError>;
}
