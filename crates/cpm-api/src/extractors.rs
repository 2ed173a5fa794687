//! # Request Extraction & Validation
//!
//! JSON bodies go through [`extract_json`] / [`extract_validated_json`] so
//! that malformed input becomes a structured 400 and rule violations a 422.
//! Path identifiers accept both the prefixed (`task:<uuid>`) and bare form.

use std::fmt::Display;
use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use cpm_core::Money;

use crate::error::AppError;

/// Request types that check business rules beyond what serde enforces.
pub trait Validate {
    /// Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Parse a path segment into a typed identifier.
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e: T::Err| AppError::BadRequest(format!("invalid identifier {raw:?}: {e}")))
}

/// Parse a money field of a request body, naming the field on failure.
pub fn parse_amount(field: &str, raw: &str) -> Result<Money, String> {
    Money::parse(raw).map_err(|e| format!("{field}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::TaskId;

    #[test]
    fn ids_accept_prefixed_and_bare() {
        let id = TaskId::new();
        let bare = id.as_uuid().to_string();
        assert_eq!(parse_id::<TaskId>(&id.to_string()).unwrap(), id);
        assert_eq!(parse_id::<TaskId>(&bare).unwrap(), id);
        assert!(matches!(
            parse_id::<TaskId>("not-an-id"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn amount_errors_name_the_field() {
        assert_eq!(parse_amount("budget", "1,250.50").unwrap(), Money::from_cents(125_050));
        let err = parse_amount("budget", "12.345").unwrap_err();
        assert!(err.starts_with("budget: "));
    }
}
