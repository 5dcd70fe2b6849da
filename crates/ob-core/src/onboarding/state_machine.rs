//! Onboarding state machine.
//!
//! Defines a pure state transition function for the questionnaire walk.
//! Side effects (submitting answers, updating the session) are returned as
//! [`OnboardingAction`]s for the orchestrator to execute.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{AnswerId, QuestionId};
use crate::onboarding::questionnaire::{Question, Questionnaire, SelectionMode};
use crate::session::Identity;

/// Accumulated answers and position of one questionnaire walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub questionnaire: Questionnaire,
    /// Position in `questionnaire.questions`.
    pub current_index: usize,
    /// Keyed by question id, so stepping back never loses a selection.
    pub answers: BTreeMap<QuestionId, Vec<AnswerId>>,
}

impl OnboardingProgress {
    pub fn new(questionnaire: Questionnaire) -> Self {
        Self {
            questionnaire,
            current_index: 0,
            answers: BTreeMap::new(),
        }
    }

    pub fn selection(&self, question: &QuestionId) -> &[AnswerId] {
        self.answers
            .get(question)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Gender, age, and every generic answer, without empty entries.
    pub fn aggregated_answers(&self) -> BTreeMap<QuestionId, Vec<AnswerId>> {
        self.answers
            .iter()
            .filter(|(_, answers)| !answers.is_empty())
            .map(|(question, answers)| (question.clone(), answers.clone()))
            .collect()
    }

    fn select(&mut self, question: &QuestionId, mode: SelectionMode, answer: AnswerId) {
        let selection = self.answers.entry(question.clone()).or_default();
        match mode {
            SelectionMode::Single => {
                selection.clear();
                selection.push(answer);
            }
            SelectionMode::Multi => {
                if let Some(pos) = selection.iter().position(|a| a == &answer) {
                    selection.remove(pos);
                } else {
                    selection.push(answer);
                }
            }
        }
    }
}

/// Onboarding flow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingState {
    NotStarted,
    GenderStep {
        progress: OnboardingProgress,
        error: Option<OnboardingError>,
    },
    AgeStep {
        progress: OnboardingProgress,
        error: Option<OnboardingError>,
    },
    /// Generic questions; the index lives in `progress.current_index`.
    QuestionWalk {
        progress: OnboardingProgress,
        error: Option<OnboardingError>,
    },
    Submitting {
        progress: OnboardingProgress,
    },
    Complete,
}

impl OnboardingState {
    pub fn progress(&self) -> Option<&OnboardingProgress> {
        match self {
            OnboardingState::GenderStep { progress, .. }
            | OnboardingState::AgeStep { progress, .. }
            | OnboardingState::QuestionWalk { progress, .. }
            | OnboardingState::Submitting { progress } => Some(progress),
            OnboardingState::NotStarted | OnboardingState::Complete => None,
        }
    }

    pub fn error(&self) -> Option<&OnboardingError> {
        match self {
            OnboardingState::GenderStep { error, .. }
            | OnboardingState::AgeStep { error, .. }
            | OnboardingState::QuestionWalk { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    /// The question shown on the current step, if the state has one.
    pub fn current_question(&self) -> Option<&Question> {
        match self {
            OnboardingState::GenderStep { progress, .. } => Some(&progress.questionnaire.gender),
            OnboardingState::AgeStep { progress, .. } => Some(&progress.questionnaire.age),
            OnboardingState::QuestionWalk { progress, .. } => progress
                .questionnaire
                .questions
                .get(progress.current_index),
            _ => None,
        }
    }

    /// Whether the "next" control is enabled.
    pub fn can_advance(&self) -> bool {
        match (self.progress(), self.current_question()) {
            (Some(progress), Some(question)) => !progress.selection(&question.id).is_empty(),
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, OnboardingState::Complete)
    }
}

/// Events that drive the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingEvent {
    /// Begin the walk with a fetched questionnaire.
    Start { questionnaire: Questionnaire },
    /// Pick (or toggle) an option of the current question.
    Select { answer: AnswerId },
    Next,
    Back,
    /// Result of the profile-setup call (from orchestrator).
    SubmissionSucceeded { identity: Identity },
    /// Result of the profile-setup call (from orchestrator).
    SubmissionFailed { reason: OnboardingError },
    /// Clear the dismissible error on the current step.
    DismissError,
}

/// Side-effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingAction {
    /// Send the aggregated answers to the profile-setup endpoint.
    SubmitAnswers {
        answers: BTreeMap<QuestionId, Vec<AnswerId>>,
    },
    /// Record completion and the updated identity in the session.
    MarkOnboardingComplete { identity: Identity },
}

/// Onboarding error types, shown on the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum OnboardingError {
    #[error("select an option to continue")]
    SelectionRequired,
    #[error("that option does not belong to this question")]
    UnknownAnswer,
    #[error("could not save your answers: {message}")]
    SubmissionFailed { message: String },
}

#[derive(Clone, Copy)]
enum Step {
    Gender,
    Age,
    Walk,
}

/// Pure onboarding state machine.
pub struct OnboardingStateMachine;

impl OnboardingStateMachine {
    pub fn transition(
        state: OnboardingState,
        event: OnboardingEvent,
    ) -> (OnboardingState, Vec<OnboardingAction>) {
        match (state, event) {
            (OnboardingState::NotStarted, OnboardingEvent::Start { questionnaire }) => (
                OnboardingState::GenderStep {
                    progress: OnboardingProgress::new(questionnaire),
                    error: None,
                },
                Vec::new(),
            ),
            (OnboardingState::Submitting { .. }, OnboardingEvent::SubmissionSucceeded { identity }) => (
                OnboardingState::Complete,
                vec![OnboardingAction::MarkOnboardingComplete { identity }],
            ),
            (OnboardingState::Submitting { progress }, OnboardingEvent::SubmissionFailed { reason }) => {
                (Self::return_to_last_step(progress, reason), Vec::new())
            }
            (
                OnboardingState::GenderStep { progress, .. },
                event @ (OnboardingEvent::Select { .. }
                | OnboardingEvent::Next
                | OnboardingEvent::Back
                | OnboardingEvent::DismissError),
            ) => Self::step(Step::Gender, progress, event),
            (
                OnboardingState::AgeStep { progress, .. },
                event @ (OnboardingEvent::Select { .. }
                | OnboardingEvent::Next
                | OnboardingEvent::Back
                | OnboardingEvent::DismissError),
            ) => Self::step(Step::Age, progress, event),
            (
                OnboardingState::QuestionWalk { progress, .. },
                event @ (OnboardingEvent::Select { .. }
                | OnboardingEvent::Next
                | OnboardingEvent::Back
                | OnboardingEvent::DismissError),
            ) => Self::step(Step::Walk, progress, event),
            (state, _event) => (state, Vec::new()),
        }
    }

    fn step(
        step: Step,
        mut progress: OnboardingProgress,
        event: OnboardingEvent,
    ) -> (OnboardingState, Vec<OnboardingAction>) {
        let Some(question) = Self::question(step, &progress) else {
            return (Self::at(step, progress, None), Vec::new());
        };
        let question_id = question.id.clone();
        let mode = Self::mode(step, question);
        let known_answer =
            matches!(&event, OnboardingEvent::Select { answer } if question.has_option(answer));

        match event {
            OnboardingEvent::Select { answer } => {
                if !known_answer {
                    return (
                        Self::at(step, progress, Some(OnboardingError::UnknownAnswer)),
                        Vec::new(),
                    );
                }
                progress.select(&question_id, mode, answer);
                (Self::at(step, progress, None), Vec::new())
            }
            OnboardingEvent::Next => {
                if progress.selection(&question_id).is_empty() {
                    return (
                        Self::at(step, progress, Some(OnboardingError::SelectionRequired)),
                        Vec::new(),
                    );
                }
                match step {
                    Step::Gender => (Self::at(Step::Age, progress, None), Vec::new()),
                    Step::Age if progress.questionnaire.questions.is_empty() => {
                        Self::submit(progress)
                    }
                    Step::Age => {
                        progress.current_index = 0;
                        (Self::at(Step::Walk, progress, None), Vec::new())
                    }
                    Step::Walk => {
                        let is_last = progress.questionnaire.last_index()
                            == Some(progress.current_index);
                        if is_last {
                            Self::submit(progress)
                        } else {
                            progress.current_index += 1;
                            (Self::at(Step::Walk, progress, None), Vec::new())
                        }
                    }
                }
            }
            OnboardingEvent::Back => match step {
                Step::Gender => (Self::at(Step::Gender, progress, None), Vec::new()),
                Step::Age => (Self::at(Step::Gender, progress, None), Vec::new()),
                Step::Walk if progress.current_index == 0 => {
                    (Self::at(Step::Walk, progress, None), Vec::new())
                }
                Step::Walk => {
                    progress.current_index -= 1;
                    (Self::at(Step::Walk, progress, None), Vec::new())
                }
            },
            OnboardingEvent::DismissError => (Self::at(step, progress, None), Vec::new()),
            _ => (Self::at(step, progress, None), Vec::new()),
        }
    }

    fn submit(progress: OnboardingProgress) -> (OnboardingState, Vec<OnboardingAction>) {
        let answers = progress.aggregated_answers();
        (
            OnboardingState::Submitting { progress },
            vec![OnboardingAction::SubmitAnswers { answers }],
        )
    }

    fn return_to_last_step(
        mut progress: OnboardingProgress,
        reason: OnboardingError,
    ) -> OnboardingState {
        match progress.questionnaire.last_index() {
            Some(last) => {
                progress.current_index = last;
                Self::at(Step::Walk, progress, Some(reason))
            }
            None => Self::at(Step::Age, progress, Some(reason)),
        }
    }

    fn question(step: Step, progress: &OnboardingProgress) -> Option<&Question> {
        match step {
            Step::Gender => Some(&progress.questionnaire.gender),
            Step::Age => Some(&progress.questionnaire.age),
            Step::Walk => progress
                .questionnaire
                .questions
                .get(progress.current_index),
        }
    }

    fn mode(step: Step, question: &Question) -> SelectionMode {
        match step {
            Step::Gender | Step::Age => SelectionMode::Single,
            Step::Walk => question.selection_mode(),
        }
    }

    fn at(
        step: Step,
        progress: OnboardingProgress,
        error: Option<OnboardingError>,
    ) -> OnboardingState {
        match step {
            Step::Gender => OnboardingState::GenderStep { progress, error },
            Step::Age => OnboardingState::AgeStep { progress, error },
            Step::Walk => OnboardingState::QuestionWalk { progress, error },
        }
    }
}
