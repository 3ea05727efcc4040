//! # Numeric Field Parsing
//!
//! The dongle often appends a secondary token to a value, separated by a single
//! space (e.g. `"108 0"`). Only the text before the first space is the value.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{GatewayError, Result};

/// Return the part of `value` before the first space
///
/// # Examples
///
/// ```
/// use obd2_gateway::wire::numeric::leading_token;
///
/// assert_eq!(leading_token("108 0"), "108");
/// assert_eq!(leading_token("51.025750"), "51.025750");
/// ```
pub fn leading_token(value: &str) -> &str {
    split_trailing(value).0
}

/// Split `value` at its first whitespace into the value and the trailing text
///
/// In a payload the trailing text is the timestamp marker of the next entry.
///
/// # Examples
///
/// ```
/// use obd2_gateway::wire::numeric::split_trailing;
///
/// assert_eq!(split_trailing("109 100"), ("109", "100"));
/// assert_eq!(split_trailing("109"), ("109", ""));
/// ```
pub fn split_trailing(value: &str) -> (&str, &str) {
    value.split_once(char::is_whitespace).unwrap_or((value, ""))
}

/// Parse a numeric field after stripping any trailing secondary token
///
/// # Errors
///
/// Returns [`GatewayError::MalformedEntry`] if the leading token is not a valid `T`.
pub fn parse_field<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let token = leading_token(value);
    token
        .parse::<T>()
        .map_err(|e| GatewayError::MalformedEntry(format!("invalid value {:?}: {}", token, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_token_without_space() {
        assert_eq!(leading_token("179"), "179");
        assert_eq!(leading_token(""), "");
    }

    #[test]
    fn test_leading_token_strips_after_first_space() {
        assert_eq!(leading_token("108 0"), "108");
        assert_eq!(leading_token("108 0 7"), "108");
    }

    #[test]
    fn test_split_trailing_keeps_rest_after_first_space() {
        assert_eq!(split_trailing("109 100"), ("109", "100"));
        assert_eq!(split_trailing("109 #12 5"), ("109", "#12 5"));
        assert_eq!(split_trailing("7284"), ("7284", ""));
        assert_eq!(split_trailing("109\n100"), ("109", "100"));
    }

    #[test]
    fn test_trailing_token_ignored_for_every_numeric_type() {
        assert_eq!(parse_field::<u64>("108 0").unwrap(), 108);
        assert_eq!(parse_field::<u32>("108 0").unwrap(), 108);
        assert_eq!(parse_field::<i32>("108 0").unwrap(), 108);
        assert_eq!(parse_field::<f64>("108 0").unwrap(), 108.0);
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(parse_field::<i32>("-1").unwrap(), -1);
        assert!((parse_field::<f64>("-122.4194").unwrap() + 122.4194).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_value_is_malformed_entry() {
        let err = parse_field::<i32>("abc 0").unwrap_err();
        match err {
            GatewayError::MalformedEntry(msg) => assert!(msg.contains("abc")),
            other => panic!("Expected MalformedEntry, got: {:?}", other),
        }
    }

    #[test]
    fn test_leading_space_yields_empty_token() {
        assert!(parse_field::<i32>(" 108").is_err());
    }
}
