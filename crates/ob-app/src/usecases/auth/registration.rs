//! OTP-gated account creation.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use ob_core::auth::{
    classify_duplicate, AuthError, AuthGrant, BackendError, OtpChallenge, OtpPurpose,
    PasswordCredentials, RegistrationForm,
};
use ob_core::ports::{AuthBackendPort, USER_ROLE};
use ob_core::SecretString;

use super::{CredentialVerifier, OtpVerifier, PasswordVerifier};

fn registration_error(err: BackendError) -> AuthError {
    match err {
        BackendError::Rejected { message, .. } => classify_duplicate(&message)
            .map(AuthError::from)
            .unwrap_or(AuthError::RegistrationFailed(message)),
        BackendError::Unauthorized => {
            AuthError::RegistrationFailed("registration was refused".into())
        }
        other => AuthError::network(other),
    }
}

/// Sign-up: email code, account creation, then a password login for the
/// session token (the register endpoint does not issue one).
pub struct RegistrationFlow {
    backend: Arc<dyn AuthBackendPort>,
    otp: OtpVerifier,
    password: PasswordVerifier,
}

impl RegistrationFlow {
    pub fn new(backend: Arc<dyn AuthBackendPort>) -> Self {
        Self {
            otp: OtpVerifier::new(backend.clone()),
            password: PasswordVerifier::new(backend.clone()),
            backend,
        }
    }

    pub async fn request_code(&self, email: &str) -> Result<OtpChallenge, AuthError> {
        self.otp.send_code(email, OtpPurpose::Registration).await
    }

    /// On `CodeInvalid` nothing was created; the same challenge can be
    /// retried with another code.
    pub async fn complete(
        &self,
        challenge: &OtpChallenge,
        code: &SecretString,
        form: RegistrationForm,
    ) -> Result<AuthGrant, AuthError> {
        if challenge.purpose != OtpPurpose::Registration
            || !challenge.target.eq_ignore_ascii_case(form.email.trim())
        {
            return Err(AuthError::CodeInvalid);
        }
        self.otp.verify_code(challenge, code).await?;

        let form = RegistrationForm {
            email: challenge.target.clone(),
            ..form
        };
        let span = info_span!("usecase.registration.complete");
        async {
            let identity = self
                .backend
                .register(&form, USER_ROLE)
                .await
                .map_err(|err| {
                    warn!(error = %err, "account creation failed");
                    registration_error(err)
                })?;
            info!(user_id = %identity.id, "account created");

            self.password
                .verify(PasswordCredentials::new(form.email, form.password))
                .await
        }
        .instrument(span)
        .await
    }
}
