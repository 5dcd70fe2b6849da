use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{AnswerId, QuestionId, UserId};

/// Affiliate metadata carried on the user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateInfo {
    #[serde(default)]
    pub is_affiliate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_code: Option<String>,
}

/// The backend user record.
///
/// Replaced wholesale on login and after onboarding submission; never
/// patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub questionnaire_answers: BTreeMap<QuestionId, Vec<AnswerId>>,
    #[serde(flatten)]
    pub affiliate: AffiliateInfo,
}

impl Identity {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            profile_pic: None,
            role: None,
            questionnaire_answers: BTreeMap::new(),
            affiliate: AffiliateInfo::default(),
        }
    }

    pub fn with_answers(mut self, answers: BTreeMap<QuestionId, Vec<AnswerId>>) -> Self {
        self.questionnaire_answers = answers;
        self
    }
}

/// The one definition of "this user has finished onboarding".
///
/// True when at least one questionnaire question carries at least one answer.
pub fn is_onboarding_complete(identity: &Identity) -> bool {
    identity
        .questionnaire_answers
        .values()
        .any(|answers| !answers.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_without_answers_is_not_onboarded() {
        let identity = Identity::new("u1", "Ada", "ada@example.com");
        assert!(!is_onboarding_complete(&identity));
    }

    #[test]
    fn identity_with_only_empty_answer_lists_is_not_onboarded() {
        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::from("q1"), Vec::new());
        let identity = Identity::new("u1", "Ada", "ada@example.com").with_answers(answers);
        assert!(!is_onboarding_complete(&identity));
    }

    #[test]
    fn identity_with_answers_is_onboarded() {
        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::from("q1"), vec![AnswerId::from("a1")]);
        let identity = Identity::new("u1", "Ada", "ada@example.com").with_answers(answers);
        assert!(is_onboarding_complete(&identity));
    }

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "_id": "65f0",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "+15550100",
            "isAffiliate": true,
            "affiliateCode": "ADA10",
            "questionnaireAnswers": { "q1": ["a1", "a2"] }
        }"#;

        let identity: Identity = serde_json::from_str(json).unwrap();

        assert_eq!(identity.id, UserId::from("65f0"));
        assert!(identity.affiliate.is_affiliate);
        assert_eq!(identity.affiliate.affiliate_code.as_deref(), Some("ADA10"));
        assert_eq!(
            identity.questionnaire_answers[&QuestionId::from("q1")],
            vec![AnswerId::from("a1"), AnswerId::from("a2")]
        );
    }

    #[test]
    fn serialized_identity_reads_back_identically() {
        let mut identity = Identity::new("u1", "Ada", "ada@example.com");
        identity.affiliate.affiliate_code = Some("REF".into());
        let json = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }
}
