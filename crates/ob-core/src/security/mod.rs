//! Secret handling primitives.

mod secret;

pub use secret::SecretString;
