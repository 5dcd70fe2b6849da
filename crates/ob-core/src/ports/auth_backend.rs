//! Backend ports
//!
//! Request/response shapes of the REST endpoints the orchestrator consumes.
//! Transport details live in the infrastructure adapter.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::auth::{AuthGrant, BackendError, FederatedAssertion, OtpPurpose, RegistrationForm};
use crate::ids::{AnswerId, QuestionId, UserId};
use crate::onboarding::Question;
use crate::security::SecretString;
use crate::session::{Identity, SessionToken};

/// Role sent with every self-service registration.
pub const USER_ROLE: &str = "user";

#[async_trait]
pub trait AuthBackendPort: Send + Sync {
    /// `POST /auth/login`
    async fn login(
        &self,
        email: &str,
        password: &SecretString,
        push_token: Option<&str>,
    ) -> Result<AuthGrant, BackendError>;

    /// `POST /auth/register/federated`. Idempotent upsert: the same canonical
    /// identity always maps to the same existing user.
    async fn register_federated(
        &self,
        assertion: &FederatedAssertion,
    ) -> Result<AuthGrant, BackendError>;

    /// `POST /otp/send`
    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), BackendError>;

    /// `POST /otp/verify`. `Ok(false)` for a wrong or expired code.
    async fn verify_otp(&self, email: &str, code: &SecretString) -> Result<bool, BackendError>;

    /// `POST /auth/register`. Creates the account; does not sign in.
    async fn register(&self, form: &RegistrationForm, role: &str)
        -> Result<Identity, BackendError>;

    /// `POST /auth/forget-password/email`, returns the reset token.
    async fn request_password_reset(&self, email: &str) -> Result<SecretString, BackendError>;

    /// `PATCH /auth/forget-password/create/new`
    async fn create_new_password(
        &self,
        reset_token: &SecretString,
        password: &SecretString,
    ) -> Result<(), BackendError>;
}

#[async_trait]
pub trait ProfileBackendPort: Send + Sync {
    /// `GET /questionnaire`
    async fn fetch_questionnaire(&self) -> Result<Vec<Question>, BackendError>;

    /// `POST /auth/setup-profile/:userId`, returns the updated user.
    async fn setup_profile(
        &self,
        token: &SessionToken,
        user_id: &UserId,
        answers: &BTreeMap<QuestionId, Vec<AnswerId>>,
    ) -> Result<Identity, BackendError>;
}
