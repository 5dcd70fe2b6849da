use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Backend-assigned account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl_id!(UserId);
