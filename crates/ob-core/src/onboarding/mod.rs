//! Onboarding domain module.
//!
//! The post-signup questionnaire: question model and the pure state machine
//! that walks it.

pub mod questionnaire;
pub mod state_machine;

pub use questionnaire::{AnswerOption, Question, Questionnaire, QuestionnaireError, SelectionMode};
pub use state_machine::{
    OnboardingAction, OnboardingError, OnboardingEvent, OnboardingProgress, OnboardingState,
    OnboardingStateMachine,
};
