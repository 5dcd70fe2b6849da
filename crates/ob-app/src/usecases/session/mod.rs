//! Session use cases.
//!
//! The session store is the single writer of the session keys in the
//! durable store and the publisher of every session change.

mod events;
mod store;

pub use events::SessionEvent;
pub use store::{SessionError, SessionStore};
