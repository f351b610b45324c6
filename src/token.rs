//! Expo push token validation.

use crate::{ExpoError, Result};

/// Check if a value is a well-formed Expo push token.
///
/// A token is valid when it is at least 15 characters long, starts with
/// `ExponentPushToken[` or `ExpoPushToken[`, and ends with `]`. The bracketed
/// content itself is opaque and not inspected further.
///
/// ```
/// use expo_push::is_expo_push_token;
///
/// assert!(is_expo_push_token("ExpoPushToken[aaaabbbbccccdddd]"));
/// assert!(!is_expo_push_token("foo"));
/// ```
pub fn is_expo_push_token(value: &str) -> bool {
    value.len() >= 15
        && (value.starts_with("ExponentPushToken[") || value.starts_with("ExpoPushToken["))
        && value.ends_with(']')
}

/// One or more push tokens.
///
/// Conversion target for APIs that accept either a single token or a list,
/// so callers can pass a `&str`, `String`, `Vec`, or slice directly.
#[derive(Debug, Clone)]
pub enum Tokens {
    /// A single token.
    Single(String),
    /// A list of tokens.
    Many(Vec<String>),
}

impl Tokens {
    /// Flatten into a plain list.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(token) => vec![token],
            Self::Many(tokens) => tokens,
        }
    }
}

impl From<&str> for Tokens {
    fn from(token: &str) -> Self {
        Self::Single(token.to_owned())
    }
}

impl From<String> for Tokens {
    fn from(token: String) -> Self {
        Self::Single(token)
    }
}

impl From<Vec<String>> for Tokens {
    fn from(tokens: Vec<String>) -> Self {
        Self::Many(tokens)
    }
}

impl From<Vec<&str>> for Tokens {
    fn from(tokens: Vec<&str>) -> Self {
        Self::Many(tokens.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[String]> for Tokens {
    fn from(tokens: &[String]) -> Self {
        Self::Many(tokens.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Tokens {
    fn from(tokens: [&str; N]) -> Self {
        Self::Many(tokens.into_iter().map(str::to_owned).collect())
    }
}

/// Filter the input down to well-formed push tokens.
///
/// Invalid tokens are dropped silently; an input that leaves no valid token
/// behind is an error.
pub fn validate_tokens(tokens: impl Into<Tokens>) -> Result<Vec<String>> {
    let valid: Vec<String> = tokens
        .into()
        .into_vec()
        .into_iter()
        .filter(|token| is_expo_push_token(token))
        .collect();

    if valid.is_empty() {
        return Err(ExpoError::NoValidTokens);
    }

    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_token_prefixes() {
        assert!(is_expo_push_token("ExpoPushToken[aaaabbbbccccdddd]"));
        assert!(is_expo_push_token("ExponentPushToken[aaaabbbbccccdddd]"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!is_expo_push_token("foo"));
        assert!(!is_expo_push_token("ExpoPushToken["));
        assert!(!is_expo_push_token("ExpoPushTokenment]"));
        assert!(!is_expo_push_token("PushToken[aaaabbbbccccdddd]"));
        assert!(!is_expo_push_token("ExpoPushToken[aaaabbbbccccdddd"));
    }

    #[test]
    fn minimum_length_is_enforced() {
        assert!(!is_expo_push_token("ExpoPushToken["));
        // 15 characters is the floor; an empty bracket pair just clears it
        assert!(is_expo_push_token("ExpoPushToken[]"));
    }

    #[test]
    fn validate_drops_invalid_tokens() {
        let tokens = validate_tokens(vec!["ExpoPushToken[aaaabbbbccccdddd]", "invalid-token]"])
            .expect("one valid token should survive");

        assert_eq!(tokens, vec!["ExpoPushToken[aaaabbbbccccdddd]"]);
    }

    #[test]
    fn validate_errors_when_nothing_survives() {
        let result = validate_tokens(vec!["invalid", "also-invalid"]);
        assert!(matches!(result, Err(ExpoError::NoValidTokens)));
    }

    #[test]
    fn validate_accepts_a_single_token() {
        let tokens = validate_tokens("ExpoPushToken[aaaabbbbccccdddd]").unwrap();
        assert_eq!(tokens.len(), 1);
    }
}
