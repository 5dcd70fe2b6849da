//! Federated identity assertions.
//!
//! Provider SDKs hand back differently shaped payloads. They are normalized
//! into one [`FederatedAssertion`] at the verifier boundary, before anything
//! downstream looks at them.

use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;

/// First name used when a provider shares no name at all.
pub const DEFAULT_FIRST_NAME: &str = "User";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FederatedProvider {
    Google,
    Apple,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppleName {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Raw provider result, as the provider SDK reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPayload {
    Google {
        email: String,
        given_name: Option<String>,
        family_name: Option<String>,
        display_name: Option<String>,
        photo_url: Option<String>,
        id_token: String,
    },
    /// Apple only shares email and name on the first authorization.
    Apple {
        email: Option<String>,
        full_name: Option<AppleName>,
        identity_token: String,
    },
}

/// Canonical identity claim sent to the register-or-login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedAssertion {
    pub provider: FederatedProvider,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_pic: Option<String>,
}

impl FederatedAssertion {
    pub fn from_payload(payload: ProviderPayload) -> Result<Self, AuthError> {
        match payload {
            ProviderPayload::Google {
                email,
                given_name,
                family_name,
                display_name,
                photo_url,
                ..
            } => {
                let (first_name, last_name) = resolve_names(given_name, family_name, display_name);
                Ok(Self {
                    provider: FederatedProvider::Google,
                    email: canonical_email(&email)?,
                    first_name,
                    last_name,
                    profile_pic: non_blank(photo_url),
                })
            }
            ProviderPayload::Apple {
                email, full_name, ..
            } => {
                let email = email.ok_or_else(|| {
                    AuthError::ProviderUnavailable("provider did not share an email".into())
                })?;
                let name = full_name.unwrap_or_default();
                let (first_name, last_name) =
                    resolve_names(name.given_name, name.family_name, None);
                Ok(Self {
                    provider: FederatedProvider::Apple,
                    email: canonical_email(&email)?,
                    first_name,
                    last_name,
                    profile_pic: None,
                })
            }
        }
    }
}

fn canonical_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::ProviderUnavailable(
            "provider returned no usable email".into(),
        ));
    }
    Ok(email)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pick first/last name from structured parts, falling back to splitting a
/// display name, falling back to [`DEFAULT_FIRST_NAME`].
fn resolve_names(
    given: Option<String>,
    family: Option<String>,
    display: Option<String>,
) -> (String, String) {
    let given = non_blank(given);
    let family = non_blank(family);

    if given.is_some() || family.is_some() {
        return (
            given.unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
            family.unwrap_or_default(),
        );
    }

    if let Some(display) = non_blank(display) {
        return match display.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
            None => (display, String::new()),
        };
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("federated payload carried no name, using default display name");

    (DEFAULT_FIRST_NAME.to_string(), String::new())
}
