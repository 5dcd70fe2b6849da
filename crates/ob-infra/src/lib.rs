//! Infrastructure adapters for the Onboard session orchestrator.
//!
//! - [`durable`]: key-value stores behind `DurableStorePort`
//! - [`http`]: the REST client behind the backend ports

pub mod durable;
pub mod http;

pub use durable::{
    default_data_dir, FileDurableStore, InMemoryDurableStore, DEFAULT_SESSION_FILE,
};
pub use http::HttpAuthBackend;
