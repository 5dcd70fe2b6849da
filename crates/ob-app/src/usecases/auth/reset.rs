//! OTP-gated password reset.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use ob_core::auth::{AuthError, BackendError, OtpChallenge, OtpPurpose, ResetTicket};
use ob_core::ports::AuthBackendPort;
use ob_core::SecretString;

use super::OtpVerifier;

/// A refused reset token means it expired or was already used.
fn reset_error(err: BackendError) -> AuthError {
    match err {
        BackendError::Unauthorized => AuthError::CodeInvalid,
        BackendError::Rejected { status, .. } if (400..500).contains(&status) => {
            AuthError::CodeInvalid
        }
        other => AuthError::network(other),
    }
}

pub struct PasswordResetFlow {
    backend: Arc<dyn AuthBackendPort>,
    otp: OtpVerifier,
}

impl PasswordResetFlow {
    pub fn new(backend: Arc<dyn AuthBackendPort>) -> Self {
        Self {
            otp: OtpVerifier::new(backend.clone()),
            backend,
        }
    }

    pub async fn request_code(&self, email: &str) -> Result<OtpChallenge, AuthError> {
        self.otp.send_code(email, OtpPurpose::PasswordReset).await
    }

    /// Check the code and exchange it for a reset ticket.
    pub async fn verify(
        &self,
        challenge: &OtpChallenge,
        code: &SecretString,
    ) -> Result<ResetTicket, AuthError> {
        if challenge.purpose != OtpPurpose::PasswordReset {
            return Err(AuthError::CodeInvalid);
        }
        self.otp.verify_code(challenge, code).await?;

        let token = self
            .backend
            .request_password_reset(&challenge.target)
            .instrument(info_span!("usecase.password_reset.request_token"))
            .await
            .map_err(|err| {
                warn!(error = %err, "reset token request failed");
                reset_error(err)
            })?;

        Ok(ResetTicket {
            email: challenge.target.clone(),
            token,
        })
    }

    /// Consumes the ticket; a new one requires a new code.
    pub async fn set_new_password(
        &self,
        ticket: ResetTicket,
        password: SecretString,
    ) -> Result<(), AuthError> {
        self.backend
            .create_new_password(&ticket.token, &password)
            .instrument(info_span!("usecase.password_reset.create_new_password"))
            .await
            .map_err(|err| {
                warn!(error = %err, "setting new password failed");
                reset_error(err)
            })?;
        info!("password reset completed");
        Ok(())
    }
}
