use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 40;
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*";
pub const CITY_MIN_LEN: usize = 2;
pub const MIN_CONSUMPTION_KWH: f64 = 0.01;

/// Umlauts and sharp s accepted next to ASCII letters in names and places.
const LOCALE_LETTERS: &[char] = &['ß', 'ö', 'ä', 'ü'];

#[derive(Debug, Clone, PartialEq, Eq)]
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Per-field error messages of a form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a field's result. An `Ok` clears a previous message.
    pub fn record(&mut self, field: &str, result: ValidationResult) {
        match result {
            Ok(()) => {
                self.0.remove(field);
            }
            Err(err) => {
                self.0.insert(field.to_string(), err.message);
            }
        }
    }

    pub fn insert(&mut self, err: ValidationError) {
        self.0.insert(err.field.to_string(), err.message);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// A form may be submitted only while this is empty.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|message| message.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First recorded message, used as the inline summary of a form.
    pub fn summary(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FormErrors {}

impl From<ValidationError> for FormErrors {
    fn from(err: ValidationError) -> Self {
        let mut errors = FormErrors::new();
        errors.insert(err);
        errors
    }
}

pub fn validate_required(field: &'static str, value: &str, message: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, message));
    }

    Ok(())
}

fn is_locale_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || LOCALE_LETTERS.contains(&ch)
}

fn all_chars(value: &str, allowed: impl Fn(char) -> bool) -> bool {
    !value.is_empty() && value.chars().all(allowed)
}

// Profile-edit field rules.

pub fn validate_name(field: &'static str, value: &str) -> ValidationResult {
    validate_required(field, value, "This field is required.")?;

    if !all_chars(value, |ch| is_locale_letter(ch) || ch.is_whitespace()) {
        return Err(ValidationError::new(
            field,
            "Only alphabetic characters are allowed.",
        ));
    }

    Ok(())
}

/// Phone rule of the profile form: digits, hyphens and dots.
pub fn validate_phone(value: &str) -> ValidationResult {
    validate_required("phone", value, "This field is required.")?;

    if !all_chars(value, |ch| ch.is_ascii_digit() || ch == '-' || ch == '.') {
        return Err(ValidationError::new(
            "phone",
            "Phone number must be valid. Examples: 1234567890, 123-456-7890, (123) 456-7890.",
        ));
    }

    Ok(())
}

pub fn validate_email(value: &str) -> ValidationResult {
    validate_required("email", value, "This field is required.")?;

    if !is_profile_email(value) {
        return Err(ValidationError::new("email", "Invalid email format."));
    }

    Ok(())
}

fn is_profile_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let local_ok = all_chars(local, |ch| {
        ch.is_ascii_alphanumeric() || ch == 'ß' || "._%+-".contains(ch)
    });
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = all_chars(host, |ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '-');
    let tld_ok = (2..=3).contains(&tld.len()) && tld.chars().all(|ch| ch.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

pub fn validate_address(value: &str) -> ValidationResult {
    validate_required("address", value, "Address is required.")?;

    if !all_chars(value, |ch| {
        is_locale_letter(ch) || ch.is_ascii_digit() || ch.is_whitespace() || ",.'-".contains(ch)
    }) {
        return Err(ValidationError::new(
            "address",
            "Address only allows numbers, letters and .-,",
        ));
    }

    Ok(())
}

pub fn validate_city(value: &str) -> ValidationResult {
    validate_required("city", value, "City is required.")?;

    if !all_chars(value, |ch| is_locale_letter(ch) || ch.is_whitespace()) {
        return Err(ValidationError::new(
            "city",
            "City can only contain letters and spaces.",
        ));
    }

    if value.chars().count() < CITY_MIN_LEN {
        return Err(ValidationError::new(
            "city",
            "City name must be at least 2 characters long.",
        ));
    }

    Ok(())
}

pub fn validate_zip_code(value: &str) -> ValidationResult {
    validate_required("zip_code", value, "This field is required.")?;

    let is_five_digits = |part: &str| part.len() == 5 && part.chars().all(|ch| ch.is_ascii_digit());
    let valid = match value.split_once('-') {
        None => is_five_digits(value),
        Some((head, tail)) => {
            is_five_digits(head) && tail.len() == 4 && tail.chars().all(|ch| ch.is_ascii_digit())
        }
    };

    if !valid {
        return Err(ValidationError::new("zip_code", "Invalid zip code format."));
    }

    Ok(())
}

/// Validates one profile field by name. Unknown fields always pass.
pub fn validate_profile_field(field: &str, value: &str) -> ValidationResult {
    match field {
        "first_name" => validate_name("first_name", value),
        "last_name" => validate_name("last_name", value),
        "phone" => validate_phone(value),
        "email" => validate_email(value),
        "address" => validate_address(value),
        "city" => validate_city(value),
        "zip_code" => validate_zip_code(value),
        _ => Ok(()),
    }
}

/// Validates each `(field, value)` pair and collects the failures.
pub fn validate_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> FormErrors {
    let mut errors = FormErrors::new();
    for (field, value) in fields {
        errors.record(field, validate_profile_field(field, value));
    }
    errors
}

// Signup-time rules. They differ from the profile rules above; each form
// keeps its own.

pub fn validate_signup_email(value: &str) -> ValidationResult {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address.",
        ));
    };

    let no_space = |part: &str| !part.is_empty() && !part.chars().any(char::is_whitespace);
    let dotted = domain
        .char_indices()
        .any(|(idx, ch)| ch == '.' && idx > 0 && idx + 1 < domain.len());

    if !(no_space(local) && no_space(domain) && dotted) {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address.",
        ));
    }

    Ok(())
}

/// Signup phone rule: the whole value must be a single digit or hyphen.
///
/// This is far stricter than [`validate_phone`] and rejects every realistic
/// phone number; both rules are kept as the two forms define them.
pub fn validate_signup_phone(value: &str) -> ValidationResult {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_digit() || ch == '-' => Ok(()),
        _ => Err(ValidationError::new(
            "phone",
            "Please enter a valid phone number (e.g., 111-111-1111 or (111) 111-1111).",
        )),
    }
}

pub fn validate_signup_name(field: &'static str, value: &str) -> ValidationResult {
    if !all_chars(value, |ch| {
        ch.is_ascii_alphabetic() || ch.is_whitespace() || ch == '\'' || ch == '-'
    }) {
        let label = if field == "last_name" { "Last" } else { "First" };
        return Err(ValidationError::new(
            field,
            format!(
                "{} name can only include letters, spaces, hyphens, and apostrophes.",
                label
            ),
        ));
    }

    Ok(())
}

pub fn validate_password(value: &str) -> ValidationResult {
    let len = value.chars().count();
    let allowed = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || PASSWORD_SPECIAL_CHARS.contains(ch));
    let has_lower = value.chars().any(|ch| ch.is_ascii_lowercase());
    let has_upper = value.chars().any(|ch| ch.is_ascii_uppercase());
    let has_digit = value.chars().any(|ch| ch.is_ascii_digit());
    let has_special = value.chars().any(|ch| PASSWORD_SPECIAL_CHARS.contains(ch));

    if !((PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
        && allowed
        && has_lower
        && has_upper
        && has_digit
        && has_special)
    {
        return Err(ValidationError::new(
            "password",
            "Please choose a password that is between 8 and 40 characters long and includes a lowercase, uppercase, number, and special character",
        ));
    }

    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult {
    if password != confirmation {
        return Err(ValidationError::new(
            "confirm_password",
            "Passwords do not match",
        ));
    }

    Ok(())
}

// Form-level checks.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> ValidationResult {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ValidationError::new(
                "username",
                "Email and password are required",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
}

impl SignupForm {
    /// Checks the fields in the signup page's order and stops at the first
    /// failure, which becomes the form's inline message.
    pub fn validate(&self) -> ValidationResult {
        validate_signup_email(self.email.trim())?;
        validate_signup_phone(&self.phone)?;
        validate_signup_name("first_name", &self.first_name)?;
        validate_signup_name("last_name", &self.last_name)?;
        validate_password(&self.password)?;
        validate_password_confirmation(&self.password, &self.confirm_password)?;
        validate_address(&self.address)?;
        validate_city(&self.city)?;
        validate_zip_code(&self.zip_code)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeterForm {
    #[serde(default)]
    pub meter_id: String,
    #[serde(default)]
    pub owner_id: i64,
}

impl MeterForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.record(
            "meter_id",
            validate_required("meter_id", &self.meter_id, "Meter ID is required."),
        );
        if self.owner_id <= 0 {
            errors.insert(ValidationError::new("owner_id", "Please select an owner."));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionForm {
    #[serde(default)]
    pub meter_id: i64,
    #[serde(default)]
    pub consumption_kwh: f64,
}

impl ConsumptionForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.meter_id <= 0 {
            errors.insert(ValidationError::new("meter_id", "Please select a meter."));
        }
        if !(self.consumption_kwh >= MIN_CONSUMPTION_KWH) {
            errors.insert(ValidationError::new(
                "consumption_kwh",
                "Consumption must be greater than 0",
            ));
        }
        errors.into_result()
    }
}
