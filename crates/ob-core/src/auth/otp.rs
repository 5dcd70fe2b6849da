use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of characters in a one-time code.
pub const OTP_CODE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Registration => "registration",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

/// An issued code request. The backend owns validity and expiry; the client
/// only keeps this long enough to pair phase 2 with phase 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub target: String,
    pub purpose: OtpPurpose,
    pub issued_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn new(target: impl Into<String>, purpose: OtpPurpose) -> Self {
        Self {
            target: target.into(),
            purpose,
            issued_at: Utc::now(),
        }
    }
}

/// Exactly [`OTP_CODE_LEN`] ASCII alphanumerics.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == OTP_CODE_LEN && code.chars().all(|c| c.is_ascii_alphanumeric())
}
