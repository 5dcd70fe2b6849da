mod orchestrator;

pub use orchestrator::{OnboardingOrchestrator, OnboardingOrchestratorError};
