//! Durable store keys owned by the session store.

pub const TOKEN: &str = "token";
pub const IDENTITY: &str = "user";
pub const THEME: &str = "theme";
pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";

/// Every key written on login and removed on logout.
pub const ALL: [&str; 4] = [TOKEN, IDENTITY, THEME, ONBOARDING_COMPLETE];

/// Encode the onboarding flag the way it is stored.
pub fn encode_flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Decode a stored onboarding flag. Anything other than `true`/`false` is unknown.
pub fn decode_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_encoding_round_trips() {
        assert_eq!(decode_flag(&encode_flag(true)), Some(true));
        assert_eq!(decode_flag(&encode_flag(false)), Some(false));
    }

    #[test]
    fn garbage_flag_is_unknown() {
        assert_eq!(decode_flag("yes"), None);
        assert_eq!(decode_flag(""), None);
    }
}
