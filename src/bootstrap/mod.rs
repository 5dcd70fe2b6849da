pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::load_config;
pub use tracing::init_tracing_subscriber;
pub use wiring::{build_runtime, build_runtime_with, OnboardRuntime, UiPorts};
