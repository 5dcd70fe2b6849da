//! Business logic use cases
//!
//! protected action
//!         ↓
//! DeferredActionCoordinator ── signed in? ── execute
//!         ↓ no
//! SignIn / RegistrationFlow / FederatedSignIn  (credential verifiers)
//!         ↓
//! SessionStore::login  →  SessionEvent::SignedIn
//!         ↓
//! OnboardingOrchestrator (when the identity has no answers)
//!         ↓
//! SessionStore::complete_onboarding  →  coordinator replays the action

mod context;
#[cfg(test)]
pub(crate) mod test_support;

pub mod auth;
pub mod deferred;
pub mod onboarding;
pub mod session;

pub use auth::{
    CredentialVerifier, FederatedSignIn, FederatedVerifier, OtpVerifier, PasswordResetFlow,
    PasswordVerifier, RegistrationFlow, SignIn, SignInOutcome,
};
pub use deferred::{AttemptOutcome, CoordinatorError, DeferredActionCoordinator};
pub use onboarding::{OnboardingOrchestrator, OnboardingOrchestratorError};
pub use session::{SessionError, SessionEvent, SessionStore};
