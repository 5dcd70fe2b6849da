use async_trait::async_trait;

/// Screen routing requested by the orchestrator. Rendering is out of scope.
#[async_trait]
pub trait NavigationPort: Send + Sync {
    async fn show_authentication(&self);
    async fn show_onboarding(&self);
}
