//! Form state shared by the edit modals and the server functions behind them.
//!
//! Drafts hold raw input strings. Rules are declared with `validator`; the
//! messages end up in [`FieldErrors`], keyed by field name.

use std::borrow::Cow;
use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// First validation message per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// One line per field, for places that can only show a single string.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, message)| format!("{}: {message}", field.replace('_', " ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Server-side rejection of a draft that slipped past the form.
    pub fn into_error(self) -> crate::Error {
        crate::Error::bad_request(self.summary())
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, errs) in errors.field_errors() {
            if let Some(first) = errs.first() {
                let message = first
                    .message
                    .clone()
                    .unwrap_or_else(|| Cow::Owned(format!("invalid value ({})", first.code)));
                out.insert(&field, message);
            }
        }
        out
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Run the declared rules of a draft.
pub fn check(draft: &impl Validate) -> Result<(), FieldErrors> {
    draft.validate().map_err(|e| FieldErrors::from(&e))
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub(crate) fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "This field is required"));
    }
    Ok(())
}

pub(crate) fn email(value: &str) -> Result<(), ValidationError> {
    use validator::ValidateEmail;

    if value.trim().validate_email() {
        return Ok(());
    }
    Err(invalid("email", "Enter a valid email address"))
}

pub(crate) fn optional_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    email(value)
}

pub(crate) fn date(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    optional_date(value)
}

pub(crate) fn optional_date(value: &str) -> Result<(), ValidationError> {
    match value.trim() {
        "" => Ok(()),
        v => v
            .parse::<Date>()
            .map(|_| ())
            .map_err(|_| invalid("date", "Use the YYYY-MM-DD format")),
    }
}

pub(crate) fn amount(value: &str) -> Result<(), ValidationError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
        Ok(_) => Err(invalid("amount", "Must be zero or more")),
        Err(_) => Err(invalid("amount", "Enter a number")),
    }
}

pub(crate) fn optional_amount(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    amount(value)
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<Date, FieldErrors> {
    value
        .trim()
        .parse()
        .map_err(|_| FieldErrors::single(field, "Use the YYYY-MM-DD format"))
}

pub(crate) fn parse_optional_date(field: &str, value: &str) -> Result<Option<Date>, FieldErrors> {
    match value.trim() {
        "" => Ok(None),
        v => parse_date(field, v).map(Some),
    }
}

pub(crate) fn parse_amount(field: &str, value: &str) -> Result<f64, FieldErrors> {
    match value.trim() {
        "" => Ok(0.0),
        v => v
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| FieldErrors::single(field, "Enter a number of zero or more")),
    }
}

pub(crate) fn optional_text(value: &str) -> Option<String> {
    match value.trim() {
        "" => None,
        v => Some(v.to_string()),
    }
}

pub(crate) fn date_input(date: Option<Date>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(custom(function = "email"))]
    pub email: String,
    #[validate(custom(function = "required"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(custom(function = "required"))]
    pub name: String,
    #[validate(custom(function = "email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Use at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm: String,
}
