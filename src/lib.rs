//! Onboard: session and onboarding orchestrator.
//!
//! The host application loads an [`AppConfig`], installs tracing, builds an
//! [`OnboardRuntime`] with its UI collaborators, and calls
//! [`OnboardRuntime::start`].

pub mod bootstrap;

pub use bootstrap::{
    build_runtime, build_runtime_with, init_tracing_subscriber, load_config, OnboardRuntime,
    UiPorts,
};
pub use ob_core::config::AppConfig;
