//! Input checks shared by the public auth routes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// One `@`, something non-blank on both sides, and a dot after the `@`.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        return Err(ApiError::field("email", "Formato de email inválido"));
    }
    Ok(())
}

pub fn validate_password(field: &str, password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::field(
            field,
            format!("A senha deve ter no mínimo {} caracteres", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

/// Returns the trimmed value of a required text field
pub fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::field(field, format!("O campo '{}' é obrigatório", field))),
    }
}

/// Like [`required`] but keeps surrounding whitespace, for secrets
pub fn required_raw<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::field(field, format!("O campo '{}' é obrigatório", field))),
    }
}

/// Parses a numeric id taken from the request path
pub fn parse_id(field: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::field(field, format!("'{}' não é um identificador válido", raw)))
}
