//! Input validation utilities
//!
//! Account changes are validated field by field; every violation is collected
//! under the name of the form field it belongs to so the form can be re-rendered
//! with the messages next to the inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use phonenumber::{country, Mode};
use regex::Regex;
use serde::Serialize;
use validator::{ValidateEmail, ValidateLength};

use crate::{
    config::ValidationConfig,
    models::{PasswordUpdate, ProfileUpdate},
};

/// Regex for validating usernames
static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9._-]*$").unwrap());

/// Field-keyed validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub errors: BTreeMap<String, String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

/// Validate a username
pub fn validate_username(username: &str) -> bool {
    !username.is_empty() && username.len() <= 64 && USERNAME_REGEX.is_match(username)
}

/// Validate a profile update, returning the profile with a normalized phone number.
///
/// An empty email or phone is accepted and stored as empty.
pub fn validate_profile_update(
    profile: &ProfileUpdate,
    rules: &ValidationConfig,
) -> (ProfileUpdate, ValidationOutcome) {
    let mut outcome = ValidationOutcome::default();
    let mut normalized = ProfileUpdate {
        first_name: profile.first_name.trim().to_string(),
        last_name: profile.last_name.trim().to_string(),
        email: profile.email.trim().to_string(),
        phone: profile.phone.trim().to_string(),
    };

    let min = rules.name_min_length as u64;
    if !normalized.first_name.validate_length(Some(min), None, None) {
        outcome.add(
            "first_name",
            format!("First name must have at least {} characters", min),
        );
    }
    if !normalized.last_name.validate_length(Some(min), None, None) {
        outcome.add(
            "last_name",
            format!("Last name must have at least {} characters", min),
        );
    }

    if !normalized.email.is_empty() && !normalized.email.validate_email() {
        outcome.add("email", "Email address is not valid");
    }

    if !normalized.phone.is_empty() {
        match rules
            .phone_region()
            .ok()
            .and_then(|region| normalize_phone(&normalized.phone, region))
        {
            Some(phone) => normalized.phone = phone,
            None => outcome.add("phone", "Phone number is not valid"),
        }
    }

    (normalized, outcome)
}

/// Validate a password change
pub fn validate_password_update(
    update: &PasswordUpdate,
    rules: &ValidationConfig,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    if update.password != update.confirm_password {
        outcome.add("confirm_password", "Both passwords must match");
    }

    let length = update.password.chars().count();
    if length < rules.password_min_length {
        outcome.add(
            "password",
            format!(
                "Password must be at least {} characters long",
                rules.password_min_length
            ),
        );
    } else if length > rules.password_max_length {
        outcome.add(
            "password",
            format!(
                "Password cannot be longer than {} characters",
                rules.password_max_length
            ),
        );
    }

    outcome
}

/// Longest accepted event type, name or application
pub const EVENT_FIELD_MAX_LENGTH: usize = 255;

/// Validate the short text fields of an event. `None` means the field is not
/// being set; a present value must be non-blank and reasonably short.
pub fn validate_event_fields(
    event_type: Option<&str>,
    name: Option<&str>,
    application: Option<&str>,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for (field, label, value, required) in [
        ("type", "Type", event_type, true),
        ("name", "Name", name, true),
        ("application", "Application", application, false),
    ] {
        let Some(value) = value else { continue };
        if required && value.trim().is_empty() {
            outcome.add(field, format!("{} must not be empty", label));
        } else if value.chars().count() > EVENT_FIELD_MAX_LENGTH {
            outcome.add(
                field,
                format!(
                    "{} cannot be longer than {} characters",
                    label, EVENT_FIELD_MAX_LENGTH
                ),
            );
        }
    }

    outcome
}

/// Event times are stored as four-digit-year timestamps.
pub fn validate_event_time(time: Option<DateTime<Utc>>, outcome: &mut ValidationOutcome) {
    if let Some(time) = time {
        if !(0..=9999).contains(&time.year()) {
            outcome.add("time", "Time must be between the years 0000 and 9999");
        }
    }
}

/// Parse a phone number in `region` and render it in national format
pub fn normalize_phone(raw: &str, region: country::Id) -> Option<String> {
    let number = phonenumber::parse(Some(region), raw).ok()?;
    if !phonenumber::is_valid(&number) {
        return None;
    }
    Some(number.format().mode(Mode::National).to_string())
}
