use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Questionnaire question identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

/// Identifier of one answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(String);

impl_id!(QuestionId, AnswerId);
