//! Validation of identifiers taken from request paths.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

const USER_ID_PATTERN: &str = r"^[A-Za-z0-9._-]{3,64}$";
const UUID_V4_PATTERN: &str =
    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";

fn user_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(USER_ID_PATTERN).expect("user id pattern is valid"))
}

fn uuid_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(UUID_V4_PATTERN).expect("uuid pattern is valid"))
}

/// Check a user ID: 3-64 ASCII letters, digits, dots, hyphens, or underscores.
///
/// # Returns
/// The ID unchanged when valid.
///
/// # Errors
/// Returns [`AppError::BadRequest`] otherwise.
pub fn validate_user_id(user_id: &str) -> Result<&str, AppError> {
    if user_id_regex().is_match(user_id) {
        Ok(user_id)
    } else {
        Err(AppError::BadRequest(
            "Invalid user ID. Must be 3-64 alphanumeric characters, hyphens, underscores, or dots."
                .to_string(),
        ))
    }
}

/// Check that a shared-config ID is a hyphenated UUID v4.
///
/// # Returns
/// The parsed UUID.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for any other shape, including UUIDs of
/// other versions and the simple (unhyphenated) form.
pub fn validate_config_id(config_id: &str) -> Result<Uuid, AppError> {
    let invalid = || AppError::BadRequest("Invalid config ID. Must be a valid UUID.".to_string());
    if !uuid_regex().is_match(config_id) {
        return Err(invalid());
    }
    Uuid::parse_str(config_id).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_follow_length_and_charset_rules() {
        let longest = "a".repeat(64);
        let too_long = "a".repeat(65);
        for ok in ["abc", "user.name-01_x", longest.as_str()] {
            assert!(validate_user_id(ok).is_ok(), "{ok}");
        }
        for bad in ["ab", "has space", "emoji🙂", "slash/id", too_long.as_str(), ""] {
            let err = validate_user_id(bad).expect_err("invalid id");
            assert!(err.to_string().contains("Invalid user ID"), "{bad}");
        }
    }

    #[test]
    fn config_ids_must_be_hyphenated_v4() {
        let id = Uuid::new_v4();
        assert_eq!(validate_config_id(&id.to_string()).unwrap(), id);
        assert_eq!(
            validate_config_id(&id.to_string().to_uppercase()).unwrap(),
            id
        );

        let simple = id.simple().to_string();
        for bad in [
            "not-a-uuid",
            simple.as_str(),
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ] {
            let err = validate_config_id(bad).expect_err("invalid id");
            assert!(err.to_string().contains("Invalid config ID"), "{bad}");
        }
    }
}
