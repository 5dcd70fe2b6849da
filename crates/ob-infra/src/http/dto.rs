//! Wire shapes of the REST endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ob_core::ids::{AnswerId, QuestionId};
use ob_core::onboarding::Question;
use ob_core::session::Identity;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<&'a str>,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FederatedRequest<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FederatedResponse {
    pub token: String,
    pub existing_user: Identity,
}

#[derive(Serialize)]
pub(crate) struct SendOtpRequest<'a> {
    pub email: &'a str,
    pub purpose: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct VerifyOtpResponse {
    pub verified: bool,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct UserResponse {
    pub user: Identity,
}

#[derive(Serialize)]
pub(crate) struct ResetRequest<'a> {
    pub email: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ResetResponse {
    pub token: String,
}

#[derive(Serialize)]
pub(crate) struct NewPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetupProfileRequest<'a> {
    pub questionnaire_answers: &'a BTreeMap<QuestionId, Vec<AnswerId>>,
}

#[derive(Deserialize)]
pub(crate) struct QuestionnaireResponse {
    pub questions: Vec<Question>,
}

/// Error body shape; only `message` is read.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
