//! In-process doubles shared by the use-case unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mockall::mock;

use ob_core::auth::{
    AuthGrant, BackendError, FederatedAssertion, OtpPurpose, RegistrationForm,
};
use ob_core::deferred::PendingAction;
use ob_core::ids::{AnswerId, QuestionId, UserId};
use ob_core::onboarding::{AnswerOption, OnboardingState, Question};
use ob_core::ports::{
    ActionExecutorPort, AuthBackendPort, DurableStorePort, NavigationPort, OnboardingEventPort,
    ProfileBackendPort,
};
use ob_core::session::{Identity, Session, SessionToken};
use ob_core::SecretString;

pub(crate) const VALID_CODE: &str = "4821";

#[derive(Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// Mutex-backed stand-in for the REST backend.
#[derive(Default)]
pub(crate) struct FakeBackend {
    accounts: Mutex<HashMap<String, Account>>,
    sent_codes: Mutex<Vec<(String, OtpPurpose)>>,
    reset_tokens: Mutex<HashMap<String, String>>,
    questions: Mutex<Vec<Question>>,
    register_error: Mutex<Option<BackendError>>,
    setup_profile_error: Mutex<Option<BackendError>>,
    offline: AtomicBool,
    verify_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_user(&self, email: &str, password: &str, onboarded: bool) -> Identity {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut identity = Identity::new(format!("user-{id}"), "Test User", email);
        if onboarded {
            identity.questionnaire_answers.insert(
                QuestionId::from("gender"),
                vec![AnswerId::from("female")],
            );
        }
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn fail_register_with(&self, err: BackendError) {
        *self.register_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_setup_profile_with(&self, err: Option<BackendError>) {
        *self.setup_profile_error.lock().unwrap() = err;
    }

    pub(crate) fn set_questions(&self, questions: Vec<Question>) {
        *self.questions.lock().unwrap() = questions;
    }

    pub(crate) fn sent_codes(&self) -> Vec<(String, OtpPurpose)> {
        self.sent_codes.lock().unwrap().clone()
    }

    pub(crate) fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn password_of(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|account| account.password.clone())
    }

    fn online(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Network("connection refused".into()));
        }
        Ok(())
    }

    fn grant_for(identity: &Identity) -> AuthGrant {
        AuthGrant {
            token: SessionToken::new(format!("token-{}", identity.id)),
            identity: identity.clone(),
        }
    }
}

#[async_trait]
impl AuthBackendPort for FakeBackend {
    async fn login(
        &self,
        email: &str,
        password: &SecretString,
        _push_token: Option<&str>,
    ) -> Result<AuthGrant, BackendError> {
        self.online()?;
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some(account) if account.password == password.expose() => {
                Ok(Self::grant_for(&account.identity))
            }
            _ => Err(BackendError::Unauthorized),
        }
    }

    async fn register_federated(
        &self,
        assertion: &FederatedAssertion,
    ) -> Result<AuthGrant, BackendError> {
        self.online()?;
        let existing = self
            .accounts
            .lock()
            .unwrap()
            .get(&assertion.email)
            .map(|account| account.identity.clone());
        let identity = match existing {
            Some(identity) => identity,
            None => self.add_user(&assertion.email, "", false),
        };
        Ok(Self::grant_for(&identity))
    }

    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), BackendError> {
        self.online()?;
        self.sent_codes
            .lock()
            .unwrap()
            .push((email.to_string(), purpose));
        Ok(())
    }

    async fn verify_otp(&self, _email: &str, code: &SecretString) -> Result<bool, BackendError> {
        self.online()?;
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(code.expose() == VALID_CODE)
    }

    async fn register(
        &self,
        form: &RegistrationForm,
        role: &str,
    ) -> Result<Identity, BackendError> {
        self.online()?;
        if let Some(err) = self.register_error.lock().unwrap().clone() {
            return Err(err);
        }
        if self.accounts.lock().unwrap().contains_key(&form.email) {
            return Err(BackendError::Rejected {
                status: 409,
                message: format!("E11000 duplicate key error dup key: {{ email: \"{}\" }}", form.email),
            });
        }
        self.add_user(&form.email, form.password.expose(), false);
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&form.email)
            .ok_or(BackendError::Unauthorized)?;
        account.identity.name = form.name.clone();
        account.identity.phone = Some(form.phone.clone());
        account.identity.role = Some(role.to_string());
        Ok(account.identity.clone())
    }

    async fn request_password_reset(&self, email: &str) -> Result<SecretString, BackendError> {
        self.online()?;
        let token = format!("reset-{email}");
        self.reset_tokens
            .lock()
            .unwrap()
            .insert(token.clone(), email.to_string());
        Ok(SecretString::new(token))
    }

    async fn create_new_password(
        &self,
        reset_token: &SecretString,
        password: &SecretString,
    ) -> Result<(), BackendError> {
        self.online()?;
        let email = self
            .reset_tokens
            .lock()
            .unwrap()
            .remove(reset_token.expose())
            .ok_or(BackendError::Rejected {
                status: 400,
                message: "reset token expired".into(),
            })?;
        if let Some(account) = self.accounts.lock().unwrap().get_mut(&email) {
            account.password = password.expose().to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileBackendPort for FakeBackend {
    async fn fetch_questionnaire(&self) -> Result<Vec<Question>, BackendError> {
        self.online()?;
        Ok(self.questions.lock().unwrap().clone())
    }

    async fn setup_profile(
        &self,
        token: &SessionToken,
        user_id: &UserId,
        answers: &BTreeMap<QuestionId, Vec<AnswerId>>,
    ) -> Result<Identity, BackendError> {
        self.online()?;
        if let Some(err) = self.setup_profile_error.lock().unwrap().clone() {
            return Err(err);
        }
        if token.expose() != format!("token-{user_id}") {
            return Err(BackendError::Unauthorized);
        }
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values_mut()
            .find(|account| &account.identity.id == user_id)
            .ok_or(BackendError::Rejected {
                status: 404,
                message: "user not found".into(),
            })?;
        account.identity.questionnaire_answers = answers.clone();
        Ok(account.identity.clone())
    }
}

/// Plain HashMap store; failure injection lives in the session store tests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl DurableStorePort for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, pairs: &[(&str, String)]) -> anyhow::Result<()> {
        let mut values = self.values.lock().unwrap();
        for (key, value) in pairs {
            values.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut values = self.values.lock().unwrap();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

pub(crate) fn option(id: &str) -> AnswerOption {
    AnswerOption {
        id: AnswerId::from(id),
        text: id.to_string(),
    }
}

pub(crate) fn question(id: &str, title: &str, options: &[&str]) -> Question {
    Question {
        id: QuestionId::from(id),
        title: title.to_string(),
        options: options.iter().map(|o| option(o)).collect(),
    }
}

/// Gender, age, one single-select and one multi-select generic question.
pub(crate) fn sample_questions() -> Vec<Question> {
    vec![
        question("gender", "What is your gender?", &["female", "male"]),
        question("age", "What is your age?", &["18-24", "25-34"]),
        question(
            "experience",
            "What is your trading experience?",
            &["none", "some", "lots"],
        ),
        question(
            "markets",
            "Which markets interest you?",
            &["stocks", "crypto", "forex"],
        ),
    ]
}

mock! {
    pub Navigation {}

    #[async_trait]
    impl NavigationPort for Navigation {
        async fn show_authentication(&self);
        async fn show_onboarding(&self);
    }
}

mock! {
    pub Executor {}

    #[async_trait]
    impl ActionExecutorPort for Executor {
        async fn execute(&self, action: &PendingAction, session: &Session) -> anyhow::Result<()>;
    }
}

mock! {
    pub OnboardingEvents {}

    #[async_trait]
    impl OnboardingEventPort for OnboardingEvents {
        async fn emit_onboarding_state_changed(&self, state: OnboardingState);
    }
}
