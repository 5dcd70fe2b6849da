//! REST client for the auth and profile endpoints.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use ob_core::auth::{AuthGrant, BackendError, FederatedAssertion, OtpPurpose, RegistrationForm};
use ob_core::config::ApiConfig;
use ob_core::ids::{AnswerId, QuestionId, UserId};
use ob_core::onboarding::Question;
use ob_core::ports::{AuthBackendPort, ProfileBackendPort};
use ob_core::session::{Identity, SessionToken};
use ob_core::SecretString;

use super::dto::{
    ErrorBody, FederatedRequest, FederatedResponse, LoginRequest, LoginResponse,
    NewPasswordRequest, QuestionnaireResponse, RegisterRequest, ResetRequest, ResetResponse,
    SendOtpRequest, SetupProfileRequest, UserResponse, VerifyOtpRequest, VerifyOtpResponse,
};

/// reqwest client for the REST backend. Implements both
/// [`AuthBackendPort`] and [`ProfileBackendPort`].
///
/// Every response is mapped onto [`BackendError`]:
///
/// - transport failures and timeouts become `Network`
/// - 401 and 403 become `Unauthorized`
/// - any other non-2xx becomes `Rejected`, carrying the JSON `message` field
///   when the body has one
/// - a 2xx body that does not match the expected shape becomes `Decode`
pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// A trailing slash on `base_url` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the TLS backend cannot be initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use ob_infra::HttpAuthBackend;
    ///
    /// let backend = HttpAuthBackend::new("https://api.example.com/", Duration::from_secs(10));
    /// assert!(backend.is_ok());
    /// ```
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client failed")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "backend request failed");
            BackendError::Network(err.to_string())
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "backend responded");
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|error| error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request rejected")
                        .to_string()
                } else {
                    body
                }
            });
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| BackendError::Network(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode(err.to_string()))
    }

    /// For endpoints that only acknowledge; the body is not inspected.
    async fn send_ack(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl AuthBackendPort for HttpAuthBackend {
    async fn login(
        &self,
        email: &str,
        password: &SecretString,
        push_token: Option<&str>,
    ) -> Result<AuthGrant, BackendError> {
        let body = LoginRequest {
            email,
            password: password.expose(),
            push_token,
        };
        let response: LoginResponse = self
            .send_json(self.client.post(self.url("/auth/login")).json(&body))
            .await?;
        Ok(AuthGrant {
            token: SessionToken::new(response.token),
            identity: response.user,
        })
    }

    async fn register_federated(
        &self,
        assertion: &FederatedAssertion,
    ) -> Result<AuthGrant, BackendError> {
        let body = FederatedRequest {
            email: &assertion.email,
            profile_pic: assertion.profile_pic.as_deref(),
            first_name: &assertion.first_name,
            last_name: &assertion.last_name,
            phone: None,
        };
        let response: FederatedResponse = self
            .send_json(
                self.client
                    .post(self.url("/auth/register/federated"))
                    .json(&body),
            )
            .await?;
        Ok(AuthGrant {
            token: SessionToken::new(response.token),
            identity: response.existing_user,
        })
    }

    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), BackendError> {
        let body = SendOtpRequest {
            email,
            purpose: purpose.as_str(),
        };
        self.send_ack(self.client.post(self.url("/otp/send")).json(&body))
            .await
    }

    async fn verify_otp(&self, email: &str, code: &SecretString) -> Result<bool, BackendError> {
        let body = VerifyOtpRequest {
            email,
            code: code.expose(),
        };
        let response: VerifyOtpResponse = self
            .send_json(self.client.post(self.url("/otp/verify")).json(&body))
            .await?;
        Ok(response.verified)
    }

    async fn register(
        &self,
        form: &RegistrationForm,
        role: &str,
    ) -> Result<Identity, BackendError> {
        let body = RegisterRequest {
            name: &form.name,
            phone: &form.phone,
            email: &form.email,
            password: form.password.expose(),
            role,
        };
        let response: UserResponse = self
            .send_json(self.client.post(self.url("/auth/register")).json(&body))
            .await?;
        Ok(response.user)
    }

    async fn request_password_reset(&self, email: &str) -> Result<SecretString, BackendError> {
        let response: ResetResponse = self
            .send_json(
                self.client
                    .post(self.url("/auth/forget-password/email"))
                    .json(&ResetRequest { email }),
            )
            .await?;
        Ok(SecretString::new(response.token))
    }

    async fn create_new_password(
        &self,
        reset_token: &SecretString,
        password: &SecretString,
    ) -> Result<(), BackendError> {
        let body = NewPasswordRequest {
            token: reset_token.expose(),
            password: password.expose(),
        };
        self.send_ack(
            self.client
                .patch(self.url("/auth/forget-password/create/new"))
                .json(&body),
        )
        .await
    }
}

#[async_trait]
impl ProfileBackendPort for HttpAuthBackend {
    async fn fetch_questionnaire(&self) -> Result<Vec<Question>, BackendError> {
        let response: QuestionnaireResponse = self
            .send_json(self.client.get(self.url("/questionnaire")))
            .await?;
        Ok(response.questions)
    }

    async fn setup_profile(
        &self,
        token: &SessionToken,
        user_id: &UserId,
        answers: &BTreeMap<QuestionId, Vec<AnswerId>>,
    ) -> Result<Identity, BackendError> {
        let body = SetupProfileRequest {
            questionnaire_answers: answers,
        };
        let response: UserResponse = self
            .send_json(
                self.client
                    .post(self.url(&format!("/auth/setup-profile/{user_id}")))
                    .bearer_auth(token.expose())
                    .json(&body),
            )
            .await?;
        Ok(response.user)
    }
}
