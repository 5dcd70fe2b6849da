//! Session domain: the authenticated-identity record and its persisted keys.

pub mod identity;
pub mod keys;
pub mod model;

pub use identity::{is_onboarding_complete, AffiliateInfo, Identity};
pub use model::{Session, SessionToken, ThemePreference, UnknownTheme};
