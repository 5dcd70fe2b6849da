use serde::{Deserialize, Serialize};

/// Failure reported by the auth backend port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// 401/403.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success status, with the server's message.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Typed failures surfaced to callers of the credential verifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("the verification code is invalid or expired")]
    CodeInvalid,

    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("an account with this phone number already exists")]
    DuplicatePhone,

    #[error("an account with this email and phone number already exists")]
    DuplicateBoth,

    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("sign-in was cancelled")]
    ProviderCancelled,

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl AuthError {
    /// The user backed out of a provider consent screen; show nothing.
    pub fn is_silent(&self) -> bool {
        matches!(self, AuthError::ProviderCancelled)
    }

    /// The account already exists; offer the login screen instead of a retry.
    pub fn suggests_login(&self) -> bool {
        matches!(
            self,
            AuthError::DuplicateEmail | AuthError::DuplicatePhone | AuthError::DuplicateBoth
        )
    }

    /// The same input may succeed on a user-initiated retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::Network(_)
                | AuthError::InvalidCredentials
                | AuthError::CodeInvalid
                | AuthError::ProviderUnavailable(_)
        )
    }

    pub fn network(err: BackendError) -> Self {
        AuthError::Network(err.to_string())
    }
}

/// Which unique field a registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateConflict {
    Email,
    Phone,
    Both,
}

impl From<DuplicateConflict> for AuthError {
    fn from(conflict: DuplicateConflict) -> Self {
        match conflict {
            DuplicateConflict::Email => AuthError::DuplicateEmail,
            DuplicateConflict::Phone => AuthError::DuplicatePhone,
            DuplicateConflict::Both => AuthError::DuplicateBoth,
        }
    }
}

const DUPLICATE_MARKERS: [&str; 4] = ["duplicate", "e11000", "already exist", "already registered"];

/// Read the backend's duplicate-key message and name the conflicting fields.
///
/// Returns `None` when the message is not a uniqueness conflict, or is one
/// that names neither email nor phone.
pub fn classify_duplicate(message: &str) -> Option<DuplicateConflict> {
    let message = message.to_ascii_lowercase();
    if !DUPLICATE_MARKERS.iter().any(|marker| message.contains(marker)) {
        return None;
    }

    let email = message.contains("email");
    let phone = message.contains("phone");
    match (email, phone) {
        (true, true) => Some(DuplicateConflict::Both),
        (true, false) => Some(DuplicateConflict::Email),
        (false, true) => Some(DuplicateConflict::Phone),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_mongo_duplicate_key_messages() {
        let email = r#"E11000 duplicate key error collection: app.users index: email_1 dup key: { email: "a@b.c" }"#;
        let phone = r#"E11000 duplicate key error collection: app.users index: phone_1 dup key: { phone: "+1555" }"#;
        assert_eq!(classify_duplicate(email), Some(DuplicateConflict::Email));
        assert_eq!(classify_duplicate(phone), Some(DuplicateConflict::Phone));
    }

    #[test]
    fn classifies_combined_conflict() {
        assert_eq!(
            classify_duplicate("Duplicate fields: email, phone"),
            Some(DuplicateConflict::Both)
        );
    }

    #[test]
    fn non_duplicate_messages_are_generic() {
        assert_eq!(classify_duplicate("email is not valid"), None);
        assert_eq!(classify_duplicate("duplicate key on username"), None);
    }

    #[test]
    fn duplicate_errors_route_to_login() {
        assert!(AuthError::from(DuplicateConflict::Both).suggests_login());
        assert!(!AuthError::CodeInvalid.suggests_login());
        assert!(AuthError::ProviderCancelled.is_silent());
        assert!(AuthError::CodeInvalid.is_retryable());
        assert!(!AuthError::DuplicateEmail.is_retryable());
    }
}
