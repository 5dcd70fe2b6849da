//! Onboarding orchestrator.
//!
//! This module drives the onboarding state machine and executes its actions
//! against the profile backend and the session store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use ob_core::auth::BackendError;
use ob_core::ids::{AnswerId, QuestionId, UserId};
use ob_core::onboarding::{
    OnboardingAction, OnboardingError, OnboardingEvent, OnboardingState, OnboardingStateMachine,
    Questionnaire, QuestionnaireError,
};
use ob_core::ports::{OnboardingEventPort, ProfileBackendPort};

use crate::usecases::context::StateContext;
use crate::usecases::session::{SessionError, SessionStore};

/// Errors produced by the onboarding orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingOrchestratorError {
    #[error("onboarding requires a signed-in session")]
    NotSignedIn,
    #[error("fetching the questionnaire failed: {0}")]
    FetchQuestionnaire(#[from] BackendError),
    #[error("questionnaire is unusable: {0}")]
    Questionnaire(#[from] QuestionnaireError),
}

/// Orchestrator that drives onboarding state and side effects.
pub struct OnboardingOrchestrator {
    context: StateContext<OnboardingState>,
    /// User the current walk belongs to.
    owner: Mutex<Option<UserId>>,
    profile: Arc<dyn ProfileBackendPort>,
    session: Arc<SessionStore>,
    event_port: Arc<dyn OnboardingEventPort>,
}

impl OnboardingOrchestrator {
    pub fn new(
        profile: Arc<dyn ProfileBackendPort>,
        session: Arc<SessionStore>,
        event_port: Arc<dyn OnboardingEventPort>,
    ) -> Self {
        Self {
            context: StateContext::new(OnboardingState::NotStarted),
            owner: Mutex::new(None),
            profile,
            session,
            event_port,
        }
    }

    pub async fn get_state(&self) -> OnboardingState {
        self.context.get_state().await
    }

    /// Enter onboarding for the current session.
    ///
    /// Users whose identity already carries answers go straight to
    /// `Complete`. A walk already in progress for the same user is left
    /// where it is; one started by another user is discarded first.
    ///
    /// # Errors
    ///
    /// - [`OnboardingOrchestratorError::NotSignedIn`] without a session
    /// - [`OnboardingOrchestratorError::FetchQuestionnaire`] when the
    ///   questionnaire could not be loaded
    /// - [`OnboardingOrchestratorError::Questionnaire`] when it lacks the
    ///   gender or age question
    pub async fn begin(&self) -> Result<OnboardingState, OnboardingOrchestratorError> {
        let session = self.session.snapshot().await;
        if !session.is_signed_in() {
            return Err(OnboardingOrchestratorError::NotSignedIn);
        }
        {
            let _dispatch_guard = self.context.acquire_dispatch_lock().await;
            self.release_foreign_walk(session.user_id()).await;
        }

        let current = self.context.get_state().await;
        if session.onboarding_complete() {
            if !current.is_complete() {
                let _dispatch_guard = self.context.acquire_dispatch_lock().await;
                info!("identity already onboarded, skipping questionnaire");
                self.set_state_and_emit(OnboardingState::Complete).await;
            }
            return Ok(OnboardingState::Complete);
        }

        match current {
            OnboardingState::NotStarted | OnboardingState::Complete => {}
            in_progress => return Ok(in_progress),
        }

        let questions = self
            .profile
            .fetch_questionnaire()
            .instrument(info_span!("usecase.onboarding_orchestrator.fetch_questionnaire"))
            .await
            .map_err(|err| {
                warn!(error = %err, "questionnaire fetch failed");
                err
            })?;
        let questionnaire = Questionnaire::from_questions(questions)?;
        debug!(
            generic_questions = questionnaire.questions.len(),
            "questionnaire loaded"
        );

        {
            // A previous user's finished walk does not carry over.
            let _dispatch_guard = self.context.acquire_dispatch_lock().await;
            if self.context.get_state().await.is_complete() {
                self.context.set_state(OnboardingState::NotStarted).await;
            }
        }
        Ok(self.dispatch(OnboardingEvent::Start { questionnaire }).await)
    }

    pub async fn select(&self, answer: AnswerId) -> OnboardingState {
        self.dispatch(OnboardingEvent::Select { answer }).await
    }

    pub async fn next(&self) -> OnboardingState {
        self.dispatch(OnboardingEvent::Next).await
    }

    pub async fn back(&self) -> OnboardingState {
        self.dispatch(OnboardingEvent::Back).await
    }

    pub async fn dismiss_error(&self) -> OnboardingState {
        self.dispatch(OnboardingEvent::DismissError).await
    }

    async fn dispatch(&self, event: OnboardingEvent) -> OnboardingState {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!("usecase.onboarding_orchestrator.dispatch", event = ?event);
        async {
            let session = self.session.snapshot().await;
            self.release_foreign_walk(session.user_id()).await;

            let mut current = self.context.get_state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = state_name(&current);
                let label = event_name(&event);
                let (next, actions) = OnboardingStateMachine::transition(current, event);
                info!(
                    from,
                    to = state_name(&next),
                    event = label,
                    "onboarding state transition"
                );
                self.set_state_and_emit(next.clone()).await;
                let follow_up_events = self.execute_actions(actions).await;
                current = next;
                pending_events.extend(follow_up_events);
            }

            current
        }
        .instrument(span)
        .await
    }

    /// Failures become follow-up events; nothing here aborts the dispatch.
    async fn execute_actions(&self, actions: Vec<OnboardingAction>) -> Vec<OnboardingEvent> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            match action {
                OnboardingAction::SubmitAnswers { answers } => {
                    debug!(questions = answers.len(), "onboarding submitting answers");
                    follow_up_events.push(self.submit_answers(answers).await);
                }
                OnboardingAction::MarkOnboardingComplete { identity } => {
                    match self.session.complete_onboarding(identity).await {
                        Ok(_) => debug!("onboarding action MarkOnboardingComplete completed"),
                        Err(SessionError::PersistenceWriteFailure { message, .. }) => {
                            warn!(error = %message, "onboarding completion kept in memory only");
                        }
                        Err(err) => {
                            warn!(error = %err, "onboarding completed without a session");
                        }
                    }
                }
            }
        }
        follow_up_events
    }

    async fn submit_answers(
        &self,
        answers: BTreeMap<QuestionId, Vec<AnswerId>>,
    ) -> OnboardingEvent {
        let session = self.session.snapshot().await;
        let (Some(token), Some(user_id)) = (session.token(), session.user_id()) else {
            return OnboardingEvent::SubmissionFailed {
                reason: OnboardingError::SubmissionFailed {
                    message: "signed out during onboarding".into(),
                },
            };
        };

        match self.profile.setup_profile(token, user_id, &answers).await {
            Ok(identity) => OnboardingEvent::SubmissionSucceeded { identity },
            Err(err) => {
                warn!(error = %err, "profile setup failed");
                OnboardingEvent::SubmissionFailed {
                    reason: OnboardingError::SubmissionFailed {
                        message: err.to_string(),
                    },
                }
            }
        }
    }

    /// Reset to `NotStarted` when the walk was started by someone other than
    /// `user_id` (including after sign-out). Must be called while holding the
    /// dispatch lock.
    async fn release_foreign_walk(&self, user_id: Option<&UserId>) {
        let mut owner = self.owner.lock().await;
        if owner.as_ref() == user_id {
            return;
        }
        if owner.is_some() && self.context.get_state().await != OnboardingState::NotStarted {
            info!(
                previous = ?owner.as_ref(),
                current = ?user_id,
                "discarding onboarding walk of another session"
            );
            self.set_state_and_emit(OnboardingState::NotStarted).await;
        }
        *owner = user_id.cloned();
    }

    async fn set_state_and_emit(&self, state: OnboardingState) {
        self.context.set_state(state.clone()).await;
        self.event_port.emit_onboarding_state_changed(state).await;
    }
}

fn state_name(state: &OnboardingState) -> &'static str {
    match state {
        OnboardingState::NotStarted => "not_started",
        OnboardingState::GenderStep { .. } => "gender_step",
        OnboardingState::AgeStep { .. } => "age_step",
        OnboardingState::QuestionWalk { .. } => "question_walk",
        OnboardingState::Submitting { .. } => "submitting",
        OnboardingState::Complete => "complete",
    }
}

fn event_name(event: &OnboardingEvent) -> &'static str {
    match event {
        OnboardingEvent::Start { .. } => "start",
        OnboardingEvent::Select { .. } => "select",
        OnboardingEvent::Next => "next",
        OnboardingEvent::Back => "back",
        OnboardingEvent::SubmissionSucceeded { .. } => "submission_succeeded",
        OnboardingEvent::SubmissionFailed { .. } => "submission_failed",
        OnboardingEvent::DismissError => "dismiss_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ob_core::session::ThemePreference;
    use ob_core::SecretString;

    use crate::usecases::test_support::{
        sample_questions, FakeBackend, MemoryStore, MockOnboardingEvents,
    };
    use crate::usecases::SignIn;
    use ob_core::auth::PasswordCredentials;

    #[derive(Default)]
    struct RecordingEvents {
        states: Mutex<Vec<OnboardingState>>,
    }

    impl RecordingEvents {
        fn names(&self) -> Vec<&'static str> {
            self.states.lock().unwrap().iter().map(state_name).collect()
        }
    }

    #[async_trait]
    impl OnboardingEventPort for RecordingEvents {
        async fn emit_onboarding_state_changed(&self, state: OnboardingState) {
            self.states.lock().unwrap().push(state);
        }
    }

    struct Harness {
        backend: Arc<FakeBackend>,
        store: Arc<SessionStore>,
        events: Arc<RecordingEvents>,
        orchestrator: OnboardingOrchestrator,
    }

    async fn signed_in(onboarded: bool) -> Harness {
        let backend = Arc::new(FakeBackend::new());
        backend.set_questions(sample_questions());
        backend.add_user("ada@example.com", "pw", onboarded);
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStore::default())));
        SignIn::new(backend.clone(), store.clone())
            .with_password(PasswordCredentials::new(
                "ada@example.com",
                SecretString::new("pw"),
            ))
            .await
            .unwrap();
        let events = Arc::new(RecordingEvents::default());
        let orchestrator =
            OnboardingOrchestrator::new(backend.clone(), store.clone(), events.clone());
        Harness {
            backend,
            store,
            events,
            orchestrator,
        }
    }

    async fn walk_to_submission(orchestrator: &OnboardingOrchestrator) -> OnboardingState {
        orchestrator.begin().await.unwrap();
        orchestrator.select(AnswerId::from("female")).await;
        orchestrator.next().await;
        orchestrator.select(AnswerId::from("25-34")).await;
        orchestrator.next().await;
        orchestrator.select(AnswerId::from("some")).await;
        orchestrator.next().await;
        orchestrator.select(AnswerId::from("crypto")).await;
        orchestrator.select(AnswerId::from("stocks")).await;
        orchestrator.next().await
    }

    #[tokio::test]
    async fn fresh_user_starts_at_gender_step() {
        let h = signed_in(false).await;

        let state = h.orchestrator.begin().await.unwrap();

        assert!(matches!(state, OnboardingState::GenderStep { .. }));
    }

    #[tokio::test]
    async fn onboarded_user_skips_questionnaire() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_user("ada@example.com", "pw", true);
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStore::default())));
        SignIn::new(backend.clone(), store.clone())
            .with_password(PasswordCredentials::new(
                "ada@example.com",
                SecretString::new("pw"),
            ))
            .await
            .unwrap();
        let mut events = MockOnboardingEvents::new();
        events
            .expect_emit_onboarding_state_changed()
            .withf(|state| state.is_complete())
            .times(1)
            .returning(|_| ());
        let orchestrator = OnboardingOrchestrator::new(backend, store, Arc::new(events));

        assert!(orchestrator.begin().await.unwrap().is_complete());
        assert!(orchestrator.begin().await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn begin_requires_session() {
        let backend = Arc::new(FakeBackend::new());
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStore::default())));
        let orchestrator = OnboardingOrchestrator::new(
            backend,
            store,
            Arc::new(RecordingEvents::default()),
        );

        let err = orchestrator.begin().await.unwrap_err();
        assert!(matches!(err, OnboardingOrchestratorError::NotSignedIn));
    }

    #[tokio::test]
    async fn completed_walk_updates_session() {
        let h = signed_in(false).await;

        let state = walk_to_submission(&h.orchestrator).await;

        assert!(state.is_complete());
        let session = h.store.snapshot().await;
        assert!(session.is_ready());
        let answers = &session.identity().unwrap().questionnaire_answers;
        assert_eq!(answers[&QuestionId::from("gender")], vec![AnswerId::from("female")]);
        assert_eq!(
            answers[&QuestionId::from("markets")],
            vec![AnswerId::from("crypto"), AnswerId::from("stocks")]
        );
        assert_eq!(
            h.events.names().last().copied(),
            Some("complete")
        );
        assert!(h.events.names().contains(&"submitting"));
    }

    #[tokio::test]
    async fn failed_submission_returns_to_last_question() {
        let h = signed_in(false).await;
        h.backend
            .fail_setup_profile_with(Some(BackendError::Network("timeout".into())));

        let state = walk_to_submission(&h.orchestrator).await;

        let OnboardingState::QuestionWalk { progress, error } = &state else {
            panic!("expected question walk, got {state:?}");
        };
        assert_eq!(progress.current_index, 1);
        assert!(matches!(error, Some(OnboardingError::SubmissionFailed { .. })));
        assert_eq!(progress.aggregated_answers().len(), 4);
        assert!(!h.store.snapshot().await.onboarding_complete());

        let cleared = h.orchestrator.dismiss_error().await;
        assert!(cleared.error().is_none());

        h.backend.fail_setup_profile_with(None);
        let retried = h.orchestrator.next().await;
        assert!(retried.is_complete());
    }

    #[tokio::test]
    async fn begin_keeps_walk_in_progress() {
        let h = signed_in(false).await;
        h.orchestrator.begin().await.unwrap();
        h.orchestrator.select(AnswerId::from("male")).await;
        h.orchestrator.next().await;

        let state = h.orchestrator.begin().await.unwrap();

        assert!(matches!(state, OnboardingState::AgeStep { .. }));
    }

    #[tokio::test]
    async fn walk_in_progress_is_discarded_for_next_user() {
        let h = signed_in(false).await;
        h.backend.add_user("bob@example.com", "pw2", false);
        h.orchestrator.begin().await.unwrap();
        h.orchestrator.select(AnswerId::from("female")).await;
        h.orchestrator.next().await;

        h.store.logout().await.unwrap();
        SignIn::new(h.backend.clone(), h.store.clone())
            .with_password(PasswordCredentials::new(
                "bob@example.com",
                SecretString::new("pw2"),
            ))
            .await
            .unwrap();
        let state = h.orchestrator.begin().await.unwrap();

        let OnboardingState::GenderStep { progress, .. } = &state else {
            panic!("expected a fresh gender step, got {state:?}");
        };
        assert!(progress.answers.is_empty());
        assert!(h.events.names().contains(&"not_started"));
    }

    #[tokio::test]
    async fn events_after_sign_out_do_not_advance_old_walk() {
        let h = signed_in(false).await;
        h.orchestrator.begin().await.unwrap();
        h.orchestrator.select(AnswerId::from("female")).await;

        h.store.logout().await.unwrap();
        let state = h.orchestrator.next().await;

        assert_eq!(state, OnboardingState::NotStarted);
    }

    #[tokio::test]
    async fn missing_gender_question_is_reported() {
        let h = signed_in(false).await;
        h.backend.set_questions(sample_questions().split_off(1));

        let err = h.orchestrator.begin().await.unwrap_err();

        assert!(matches!(
            err,
            OnboardingOrchestratorError::Questionnaire(QuestionnaireError::MissingGenderQuestion)
        ));
    }

    #[tokio::test]
    async fn theme_survives_onboarding() {
        let h = signed_in(false).await;
        h.store
            .set_theme_preference(ThemePreference::Dark)
            .await
            .unwrap();

        walk_to_submission(&h.orchestrator).await;

        assert_eq!(h.store.snapshot().await.theme(), ThemePreference::Dark);
    }
}
