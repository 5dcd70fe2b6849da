//! Onboard application orchestration layer
//!
//! This crate contains the use cases that drive the core ports: the session
//! store, credential verifiers and OTP flows, the onboarding orchestrator,
//! and the deferred-action coordinator.

pub mod usecases;

pub use usecases::{
    AttemptOutcome, CoordinatorError, CredentialVerifier, DeferredActionCoordinator,
    FederatedSignIn, FederatedVerifier, OnboardingOrchestrator, OnboardingOrchestratorError,
    OtpVerifier, PasswordResetFlow, PasswordVerifier, RegistrationFlow, SessionError,
    SessionEvent, SessionStore, SignIn, SignInOutcome,
};
