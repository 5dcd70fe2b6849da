//! # ob-core
//!
//! Core domain models and business rules for the Onboard session orchestrator.
//!
//! This crate contains pure logic without any infrastructure dependencies:
//! the session record, credential and OTP value types, the onboarding
//! questionnaire state machine, the deferred-action model, and the ports
//! implemented by the infrastructure layer.

pub mod auth;
pub mod config;
pub mod deferred;
pub mod ids;
pub mod onboarding;
pub mod ports;
pub mod security;
pub mod session;

pub use auth::{AuthError, AuthGrant, BackendError};
pub use config::AppConfig;
pub use deferred::PendingAction;
pub use ids::{AnswerId, CourseId, QuestionId, UserId};
pub use onboarding::{
    OnboardingAction, OnboardingError, OnboardingEvent, OnboardingState, OnboardingStateMachine,
};
pub use security::SecretString;
pub use session::{is_onboarding_complete, Identity, Session, SessionToken, ThemePreference};
