//! Deferred protected actions.
//!
//! A protected action attempted without a usable session is parked here
//! until sign-in (and onboarding) finish. Never persisted.

use serde::{Deserialize, Serialize};

use crate::ids::CourseId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingAction {
    /// Continue a purchase opened from a referral / affiliate link.
    ResumePurchase {
        course_id: CourseId,
        referral_code: Option<String>,
    },
}

impl PendingAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PendingAction::ResumePurchase { .. } => "resume_purchase",
        }
    }
}
