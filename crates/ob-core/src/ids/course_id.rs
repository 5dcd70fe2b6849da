use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identifier of a purchasable course (the target of referral links).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl_id!(CourseId);
