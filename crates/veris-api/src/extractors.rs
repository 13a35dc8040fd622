//! # Request Validation
//!
//! Request DTOs implement [`Validate`] for the business rules serde
//! cannot express, and handlers funnel their JSON bodies through
//! [`extract_validated_json`] so both malformed JSON and rule
//! violations surface as the same 422 validation error.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Longest accepted `userId`, matching the column width in the
/// snapshot table.
pub const MAX_USER_ID_LEN: usize = 255;

/// Business-rule validation for a deserialized request body.
pub trait Validate {
    /// Returns a human-readable message for the first violated rule.
    fn validate(&self) -> Result<(), String>;
}

/// Deserialize and validate a JSON body in one step.
///
/// Handlers take `Result<Json<T>, JsonRejection>` instead of a bare
/// `Json<T>` so rejection turns into our error body rather than
/// axum's default plain-text response.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|err| AppError::Validation(err.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Shared `userId` rule used by every request body that names a scope.
pub fn check_user_id(user_id: &str) -> Result<(), String> {
    if user_id.trim().is_empty() {
        return Err("userId must not be empty".to_string());
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(format!("userId must not exceed {MAX_USER_ID_LEN} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rules() {
        assert!(check_user_id("user-123").is_ok());
        assert!(check_user_id("").is_err());
        assert!(check_user_id("   ").is_err());
        assert!(check_user_id(&"x".repeat(MAX_USER_ID_LEN)).is_ok());
        assert!(check_user_id(&"x".repeat(MAX_USER_ID_LEN + 1)).is_err());
    }

    #[test]
    fn validation_failure_maps_to_validation_error() {
        #[derive(Debug)]
        struct Rejecting;
        impl Validate for Rejecting {
            fn validate(&self) -> Result<(), String> {
                Err("nope".to_string())
            }
        }

        let err = extract_validated_json(Ok(Json(Rejecting))).unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "nope"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
