//! Two-phase one-time-code verification.

use std::sync::Arc;

use tracing::{debug, info_span, warn, Instrument};

use ob_core::auth::{is_well_formed_code, AuthError, BackendError, OtpChallenge, OtpPurpose};
use ob_core::ports::AuthBackendPort;
use ob_core::SecretString;

pub struct OtpVerifier {
    backend: Arc<dyn AuthBackendPort>,
}

impl OtpVerifier {
    pub fn new(backend: Arc<dyn AuthBackendPort>) -> Self {
        Self { backend }
    }

    /// Phase 1: ask the backend to deliver a code to `target`.
    pub async fn send_code(
        &self,
        target: &str,
        purpose: OtpPurpose,
    ) -> Result<OtpChallenge, AuthError> {
        let target = target.trim().to_lowercase();
        let span = info_span!("usecase.otp.send_code", purpose = purpose.as_str());

        async {
            self.backend
                .send_otp(&target, purpose)
                .await
                .map_err(|err| {
                    warn!(error = %err, "sending verification code failed");
                    AuthError::network(err)
                })?;
            debug!("verification code sent");
            Ok(OtpChallenge::new(target.clone(), purpose))
        }
        .instrument(span)
        .await
    }

    /// Phase 2: check a code against an issued challenge.
    ///
    /// Malformed codes never reach the backend.
    pub async fn verify_code(
        &self,
        challenge: &OtpChallenge,
        code: &SecretString,
    ) -> Result<(), AuthError> {
        if !is_well_formed_code(code.expose()) {
            debug!("rejecting malformed verification code locally");
            return Err(AuthError::CodeInvalid);
        }

        let span = info_span!(
            "usecase.otp.verify_code",
            purpose = challenge.purpose.as_str()
        );
        async {
            match self.backend.verify_otp(&challenge.target, code).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(AuthError::CodeInvalid),
                Err(BackendError::Unauthorized) => Err(AuthError::CodeInvalid),
                Err(BackendError::Rejected { status, .. }) if (400..500).contains(&status) => {
                    Err(AuthError::CodeInvalid)
                }
                Err(err) => {
                    warn!(error = %err, "verification code check failed");
                    Err(AuthError::network(err))
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{FakeBackend, VALID_CODE};

    #[tokio::test]
    async fn send_code_normalizes_target() {
        let backend = Arc::new(FakeBackend::new());
        let otp = OtpVerifier::new(backend.clone());

        let challenge = otp
            .send_code(" Ada@Example.com", OtpPurpose::Registration)
            .await
            .unwrap();

        assert_eq!(challenge.target, "ada@example.com");
        assert_eq!(
            backend.sent_codes(),
            vec![("ada@example.com".to_string(), OtpPurpose::Registration)]
        );
    }

    #[tokio::test]
    async fn malformed_code_skips_backend() {
        let backend = Arc::new(FakeBackend::new());
        let otp = OtpVerifier::new(backend.clone());
        let challenge = OtpChallenge::new("a@b.c", OtpPurpose::Registration);

        let err = otp
            .verify_code(&challenge, &SecretString::new("12"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::CodeInvalid);
        assert_eq!(backend.verify_calls(), 0);
    }

    #[tokio::test]
    async fn wrong_code_then_right_code() {
        let backend = Arc::new(FakeBackend::new());
        let otp = OtpVerifier::new(backend);
        let challenge = OtpChallenge::new("a@b.c", OtpPurpose::PasswordReset);

        let wrong = otp.verify_code(&challenge, &SecretString::new("0000")).await;
        let right = otp
            .verify_code(&challenge, &SecretString::new(VALID_CODE))
            .await;

        assert_eq!(wrong, Err(AuthError::CodeInvalid));
        assert_eq!(right, Ok(()));
    }
}
