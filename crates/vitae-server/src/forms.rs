//! Form validation.
//!
//! Validators follow the usual web-form rules and messages. Errors are
//! collected per field so a client can show all of them at once.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use vitae_store::{LookupKind, PersonalDetails, Section, SqliteStore};

use crate::error::AppError;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const PASSWORDS_MUST_MATCH: &str = "Passwords must match.";
pub const NOT_A_VALID_CHOICE: &str = "Not a valid choice";
pub const DATE_ORDER: &str = "End date must not be before start date.";
pub const BIRTHDATE_IN_FUTURE: &str = "Birthdate cannot be in the future.";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Validation errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// Fold a list item's errors in as `entries-{index}-{field}`.
    pub fn merge_indexed(&mut self, index: usize, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("entries-{}-{}", index, field))
                .or_default()
                .extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

// ---------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------

/// Returns false (and records an error) when `value` is blank.
pub fn required(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        false
    } else {
        true
    }
}

pub fn email(errors: &mut FieldErrors, field: &str, value: &str) {
    if !EMAIL_RE.is_match(value.trim()) {
        errors.add(field, INVALID_EMAIL);
    }
}

/// Character count must fall within `min..=max`.
pub fn length(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let n = value.chars().count();
    if n < min || n > max {
        errors.add(
            field,
            format!("Field must be between {} and {} characters long.", min, max),
        );
    }
}

pub fn equal_to(errors: &mut FieldErrors, field: &str, value: &str, other: &str) {
    if value != other {
        errors.add(field, PASSWORDS_MUST_MATCH);
    }
}

// ---------------------------------------------------------------
// Account forms
// ---------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if required(&mut errors, "email", &self.email) {
            email(&mut errors, "email", &self.email);
        }
        required(&mut errors, "password", &self.password);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

impl RegisterForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if required(&mut errors, "email", &self.email) {
            email(&mut errors, "email", &self.email);
            length(&mut errors, "email", self.email.trim(), 6, 40);
        }
        if required(&mut errors, "password", &self.password) {
            length(&mut errors, "password", &self.password, 6, 25);
        }
        if required(&mut errors, "confirm", &self.confirm) {
            equal_to(&mut errors, "confirm", &self.confirm, &self.password);
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

impl ChangePasswordForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if required(&mut errors, "password", &self.password) {
            length(&mut errors, "password", &self.password, 6, 25);
        }
        if required(&mut errors, "confirm", &self.confirm) {
            equal_to(&mut errors, "confirm", &self.confirm, &self.password);
        }
        errors
    }
}

// ---------------------------------------------------------------
// Data forms
// ---------------------------------------------------------------

fn check_lookup(
    store: &SqliteStore,
    errors: &mut FieldErrors,
    field: &str,
    kind: LookupKind,
    value: &str,
) -> vitae_core::Result<()> {
    if !store.lookup_exists(kind, value)? {
        errors.add(field, NOT_A_VALID_CHOICE);
    }
    Ok(())
}

/// Validate one section entry against its required fields, date order and
/// lookup references.
pub fn validate_section<T: Section>(
    store: &SqliteStore,
    entry: &T,
) -> vitae_core::Result<FieldErrors> {
    let mut errors = FieldErrors::new();
    for (field, value) in entry.required_fields() {
        required(&mut errors, field, value);
    }
    for (field, start, end) in entry.date_ranges() {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.add(field, DATE_ORDER);
            }
        }
    }
    for (field, kind, value) in entry.lookup_refs() {
        check_lookup(store, &mut errors, field, kind, value)?;
    }
    Ok(errors)
}

pub fn validate_personal(
    store: &SqliteStore,
    details: &PersonalDetails,
    today: NaiveDate,
) -> vitae_core::Result<FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(alt) = details.alt_email.as_deref() {
        email(&mut errors, "alt_email", alt);
    }
    if let Some(birthdate) = details.birthdate {
        if birthdate > today {
            errors.add("birthdate", BIRTHDATE_IN_FUTURE);
        }
    }
    if let Some(gender) = details.gender.as_deref() {
        check_lookup(store, &mut errors, "gender", LookupKind::Gender, gender)?;
    }
    Ok(errors)
}
