//! Credential verification and the flows built on it.

mod federated;
mod otp;
mod password;
mod registration;
mod reset;
mod sign_in;
mod verifier;

pub use federated::{FederatedSignIn, FederatedVerifier};
pub use otp::OtpVerifier;
pub use password::PasswordVerifier;
pub use registration::RegistrationFlow;
pub use reset::PasswordResetFlow;
pub use sign_in::{SignIn, SignInOutcome};
pub use verifier::CredentialVerifier;
