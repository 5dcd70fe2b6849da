//! Credential, OTP and federated-identity value types.

pub mod credentials;
pub mod error;
pub mod federated;
pub mod otp;

pub use credentials::{AuthGrant, PasswordCredentials, RegistrationForm, ResetTicket};
pub use error::{classify_duplicate, AuthError, BackendError, DuplicateConflict};
pub use federated::{
    AppleName, FederatedAssertion, FederatedProvider, ProviderPayload, DEFAULT_FIRST_NAME,
};
pub use otp::{is_well_formed_code, OtpChallenge, OtpPurpose, OTP_CODE_LEN};
