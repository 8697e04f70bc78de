//! Field-level input checks shared by the request payloads of every tool.

use reqwest::Url;

/// Rejected input, reported against the form field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

const MAX_TEXT_LEN: usize = 4000;

pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::new(
            field,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text, collapsing blank values to `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => required_text(field, text).map(Some),
    }
}

pub fn percentage(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::new(field, "must be between 0 and 100"));
    }
    Ok(value)
}

pub fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(field, "must be zero or greater"));
    }
    Ok(value)
}

pub fn calendar_month(year: i32, month: u32) -> Result<(), ValidationError> {
    if !(2000..=9999).contains(&year) {
        return Err(ValidationError::new("year", "must be between 2000 and 9999"));
    }
    if !(1..=12).contains(&month) {
        return Err(ValidationError::new("month", "must be between 1 and 12"));
    }
    Ok(())
}

/// Accepts absolute `http`/`https` URLs with a host.
pub fn http_url(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = required_text(field, value)?;
    let parsed =
        Url::parse(&trimmed).map_err(|err| ValidationError::new(field, format!("invalid URL ({err})")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::new(field, "must use http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::new(field, "must include a host"));
    }
    Ok(trimmed)
}

pub fn optional_http_url(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) => http_url(field, url).map(Some),
    }
}
