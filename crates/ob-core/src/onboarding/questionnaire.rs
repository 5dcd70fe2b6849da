use serde::{Deserialize, Serialize};

use crate::ids::{AnswerId, QuestionId};

/// Title fragments of the questions where picking an option replaces the
/// previous pick instead of toggling it.
const SINGLE_SELECT_TITLES: [&str; 2] = ["trading experience", "trading consistency"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Selecting replaces the prior selection.
    Single,
    /// Selecting toggles; at least one selection required to advance.
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    #[serde(alias = "_id")]
    pub id: AnswerId,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(alias = "_id")]
    pub id: QuestionId,
    pub title: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn selection_mode(&self) -> SelectionMode {
        let title = self.title.to_lowercase();
        if SINGLE_SELECT_TITLES
            .iter()
            .any(|fragment| title.contains(fragment))
        {
            SelectionMode::Single
        } else {
            SelectionMode::Multi
        }
    }

    pub fn has_option(&self, answer: &AnswerId) -> bool {
        self.options.iter().any(|option| &option.id == answer)
    }

    fn title_has_word(&self, word: &str) -> bool {
        self.title
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionnaireError {
    #[error("questionnaire has no gender question")]
    MissingGenderQuestion,
    #[error("questionnaire has no age question")]
    MissingAgeQuestion,
}

/// The full questionnaire: two dedicated leading steps, then the generic walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub gender: Question,
    pub age: Question,
    pub questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(gender: Question, age: Question, questions: Vec<Question>) -> Self {
        Self {
            gender,
            age,
            questions,
        }
    }

    /// Split the backend's flat question list into the gender step, the age
    /// step, and the remaining questions in their original order.
    pub fn from_questions(all: Vec<Question>) -> Result<Self, QuestionnaireError> {
        let mut gender = None;
        let mut age = None;
        let mut questions = Vec::with_capacity(all.len());

        for question in all {
            if gender.is_none() && question.title_has_word("gender") {
                gender = Some(question);
            } else if age.is_none() && question.title_has_word("age") {
                age = Some(question);
            } else {
                questions.push(question);
            }
        }

        Ok(Self {
            gender: gender.ok_or(QuestionnaireError::MissingGenderQuestion)?,
            age: age.ok_or(QuestionnaireError::MissingAgeQuestion)?,
            questions,
        })
    }

    pub fn last_index(&self) -> Option<usize> {
        self.questions.len().checked_sub(1)
    }
}
