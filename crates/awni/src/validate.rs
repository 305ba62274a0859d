//! Intake validation for request and volunteer submissions.
//!
//! All checks here run before any external call (classifier, gateway), so
//! a rejected submission has no side effects.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Minimum length for a request description.
pub const MIN_REQUEST_TEXT_LEN: usize = 10;

/// Minimum length for a location string.
pub const MIN_LOCATION_LEN: usize = 3;

/// Minimum length for a full name or profession.
pub const MIN_NAME_LEN: usize = 2;

/// Phone length bounds, inclusive.
pub const PHONE_LEN_RANGE: std::ops::RangeInclusive<usize> = 7..=20;

/// Loose phone pattern: optional leading `+`, then digits, spaces, and
/// hyphens, starting and ending on a digit.
fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\+?[0-9](?:[0-9 \-]*[0-9])?$").expect("phone pattern is valid")
    })
}

/// Minimal email shape: one `@`, non-empty local part, dotted domain.
fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
}

/// Validate a contact phone string against the loose phone pattern.
///
/// # Errors
///
/// Returns a validation error if the phone is outside the 7–20 character
/// range or contains characters beyond digits, spaces, hyphens, and a
/// leading `+`.
pub fn validate_phone(phone: &str) -> Result<()> {
    let phone = phone.trim();
    if !PHONE_LEN_RANGE.contains(&phone.chars().count()) {
        return Err(Error::validation(
            "contact phone must be between 7 and 20 characters",
        ));
    }
    if !phone_pattern().is_match(phone) {
        return Err(Error::validation(
            "contact phone may only contain digits, spaces, hyphens, and a leading +",
        ));
    }
    Ok(())
}

/// Validate a free-text request description.
///
/// # Errors
///
/// Returns a validation error if the text is shorter than
/// [`MIN_REQUEST_TEXT_LEN`] characters.
pub fn validate_request_text(text: &str) -> Result<()> {
    if text.trim().chars().count() < MIN_REQUEST_TEXT_LEN {
        return Err(Error::validation(format!(
            "request text must be at least {MIN_REQUEST_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a location string.
///
/// # Errors
///
/// Returns a validation error if the location is shorter than
/// [`MIN_LOCATION_LEN`] characters.
pub fn validate_location(location: &str) -> Result<()> {
    if location.trim().chars().count() < MIN_LOCATION_LEN {
        return Err(Error::validation(format!(
            "location must be at least {MIN_LOCATION_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate an email address shape.
///
/// # Errors
///
/// Returns a validation error if the email does not match the minimal
/// `local@domain.tld` shape.
pub fn validate_email(email: &str) -> Result<()> {
    if !email_pattern().is_match(email.trim()) {
        return Err(Error::validation("email address is not valid"));
    }
    Ok(())
}

/// Validate a named field against the two-character minimum.
///
/// # Errors
///
/// Returns a validation error naming the field if it is too short.
pub fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().chars().count() < MIN_NAME_LEN {
        return Err(Error::validation(format!(
            "{field} must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate that a named field is non-empty after trimming.
///
/// # Errors
///
/// Returns a validation error naming the field if it is blank.
pub fn validate_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
