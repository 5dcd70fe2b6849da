use crate::onboarding::OnboardingState;

#[async_trait::async_trait]
pub trait OnboardingEventPort: Send + Sync {
    async fn emit_onboarding_state_changed(&self, state: OnboardingState);
}
