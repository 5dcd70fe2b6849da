//! Shared fakes for the end-to-end use-case tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ob_core::auth::{AuthGrant, BackendError, FederatedAssertion, OtpPurpose, RegistrationForm};
use ob_core::deferred::PendingAction;
use ob_core::ids::{AnswerId, QuestionId, UserId};
use ob_core::onboarding::{AnswerOption, OnboardingState, Question};
use ob_core::ports::{
    ActionExecutorPort, AuthBackendPort, NavigationPort, OnboardingEventPort, ProfileBackendPort,
};
use ob_core::session::{Identity, Session, SessionToken};
use ob_core::SecretString;

pub const CODE: &str = "7351";

/// REST backend double keyed by email.
#[derive(Default)]
pub struct Backend {
    users: Mutex<HashMap<String, (String, Identity)>>,
    next_id: AtomicUsize,
    pub fail_setup_profile: AtomicBool,
    pub register_calls: AtomicUsize,
}

impl Backend {
    pub fn seed(&self, email: &str, password: &str, answers: BTreeMap<QuestionId, Vec<AnswerId>>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let identity = Identity::new(format!("u{id}"), "Seeded", email).with_answers(answers);
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), identity));
    }

    fn grant(identity: &Identity) -> AuthGrant {
        AuthGrant {
            token: SessionToken::new(format!("jwt-{}", identity.id)),
            identity: identity.clone(),
        }
    }
}

#[async_trait]
impl AuthBackendPort for Backend {
    async fn login(
        &self,
        email: &str,
        password: &SecretString,
        _push_token: Option<&str>,
    ) -> Result<AuthGrant, BackendError> {
        match self.users.lock().unwrap().get(email) {
            Some((stored, identity)) if stored == password.expose() => Ok(Self::grant(identity)),
            _ => Err(BackendError::Unauthorized),
        }
    }

    async fn register_federated(
        &self,
        assertion: &FederatedAssertion,
    ) -> Result<AuthGrant, BackendError> {
        if !self.users.lock().unwrap().contains_key(&assertion.email) {
            self.seed(&assertion.email, "", BTreeMap::new());
        }
        let users = self.users.lock().unwrap();
        let (_, identity) = &users[&assertion.email];
        Ok(Self::grant(identity))
    }

    async fn send_otp(&self, _email: &str, _purpose: OtpPurpose) -> Result<(), BackendError> {
        Ok(())
    }

    async fn verify_otp(&self, _email: &str, code: &SecretString) -> Result<bool, BackendError> {
        Ok(code.expose() == CODE)
    }

    async fn register(&self, form: &RegistrationForm, role: &str) -> Result<Identity, BackendError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if self.users.lock().unwrap().contains_key(&form.email) {
            return Err(BackendError::Rejected {
                status: 409,
                message: "duplicate key: email".into(),
            });
        }
        self.seed(&form.email, form.password.expose(), BTreeMap::new());
        let mut users = self.users.lock().unwrap();
        let (_, identity) = users
            .get_mut(&form.email)
            .ok_or(BackendError::Unauthorized)?;
        identity.role = Some(role.to_string());
        Ok(identity.clone())
    }

    async fn request_password_reset(&self, email: &str) -> Result<SecretString, BackendError> {
        Ok(SecretString::new(format!("reset:{email}")))
    }

    async fn create_new_password(
        &self,
        reset_token: &SecretString,
        password: &SecretString,
    ) -> Result<(), BackendError> {
        let email = reset_token
            .expose()
            .strip_prefix("reset:")
            .ok_or(BackendError::Unauthorized)?;
        if let Some(user) = self.users.lock().unwrap().get_mut(email) {
            user.0 = password.expose().to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileBackendPort for Backend {
    async fn fetch_questionnaire(&self) -> Result<Vec<Question>, BackendError> {
        Ok(questions())
    }

    async fn setup_profile(
        &self,
        _token: &SessionToken,
        user_id: &UserId,
        answers: &BTreeMap<QuestionId, Vec<AnswerId>>,
    ) -> Result<Identity, BackendError> {
        if self.fail_setup_profile.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                status: 500,
                message: "database unavailable".into(),
            });
        }
        let mut users = self.users.lock().unwrap();
        let (_, identity) = users
            .values_mut()
            .find(|(_, identity)| &identity.id == user_id)
            .ok_or(BackendError::Unauthorized)?;
        identity.questionnaire_answers = answers.clone();
        Ok(identity.clone())
    }
}

fn question(id: &str, title: &str, options: &[&str]) -> Question {
    Question {
        id: QuestionId::from(id),
        title: title.to_string(),
        options: options
            .iter()
            .map(|option| AnswerOption {
                id: AnswerId::from(*option),
                text: option.to_string(),
            })
            .collect(),
    }
}

pub fn questions() -> Vec<Question> {
    vec![
        question("q-gender", "Gender", &["female", "male", "other"]),
        question("q-age", "Age", &["18-24", "25-34", "35+"]),
        question(
            "q-consistency",
            "How would you rate your trading consistency?",
            &["low", "medium", "high"],
        ),
        question("q-goals", "What are your goals?", &["income", "learning"]),
    ]
}

#[derive(Default)]
pub struct Navigation {
    pub authentication: AtomicUsize,
    pub onboarding: AtomicUsize,
}

#[async_trait]
impl NavigationPort for Navigation {
    async fn show_authentication(&self) {
        self.authentication.fetch_add(1, Ordering::SeqCst);
    }

    async fn show_onboarding(&self) {
        self.onboarding.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct Executor {
    pub executed: Mutex<Vec<(PendingAction, Session)>>,
}

impl Executor {
    pub fn count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }
}

#[async_trait]
impl ActionExecutorPort for Executor {
    async fn execute(&self, action: &PendingAction, session: &Session) -> anyhow::Result<()> {
        self.executed
            .lock()
            .unwrap()
            .push((action.clone(), session.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct Events {
    pub states: Mutex<Vec<OnboardingState>>,
}

#[async_trait]
impl OnboardingEventPort for Events {
    async fn emit_onboarding_state_changed(&self, state: OnboardingState) {
        self.states.lock().unwrap().push(state);
    }
}

pub fn arc<T: Default>() -> Arc<T> {
    Arc::new(T::default())
}
