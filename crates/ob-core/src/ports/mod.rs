//! Port interfaces for the application layer
//!
//! Ports define the contract between the application logic (use cases)
//! and infrastructure implementations. The session orchestrator talks to
//! storage, the backend, identity-provider SDKs and the UI only through
//! these traits, so every use case can be tested against in-memory fakes.

pub mod action_executor;
pub mod auth_backend;
pub mod durable_store;
pub mod identity_provider;
pub mod navigation;
pub mod onboarding_event;

pub use action_executor::ActionExecutorPort;
pub use auth_backend::{AuthBackendPort, ProfileBackendPort, USER_ROLE};
pub use durable_store::DurableStorePort;
pub use identity_provider::IdentityProviderPort;
pub use navigation::NavigationPort;
pub use onboarding_event::OnboardingEventPort;
