//! Patient Identity and Demographics Integrity
//!
//! Defines the patient row, the human-readable patient number, the
//! registration form and the contact-information patch, together with the
//! validation each of them must pass before anything is written.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use hms_shared::{
    validate_required_text, HmsError, HmsResult, RecordKey, ValidationErrorCode, ValidationResult,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Patient row as stored in `patients`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    /// Store-assigned key (internal)
    pub id: RecordKey,
    /// Human-readable identifier issued at registration
    pub patient_number: PatientNumber,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact_number: String,
    pub address: String,
    /// Registration timestamp, assigned by the store
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[display(fmt = "male")]
    Male,
    #[display(fmt = "female")]
    Female,
    #[display(fmt = "other")]
    Other,
}

impl FromStr for Gender {
    type Err = HmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(HmsError::validation(format!(
                "gender must be male, female or other, got {:?}",
                other
            ))),
        }
    }
}

/// Number of random digits at the end of a patient number
pub const SUFFIX_DIGITS: usize = 5;

/// Distinct suffixes available per prefix and year
pub const SUFFIX_SPACE: u32 = 100_000;

/// Human-readable patient identifier, `<PREFIX>-<year>-<5 digits>` (e.g. `HMS-2025-04217`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct PatientNumber(String);

impl PatientNumber {
    /// Build a number from its parts; the suffix is reduced into the 5-digit space
    pub fn new(prefix: &str, year: i32, suffix: u32) -> Self {
        PatientNumber(format!(
            "{}-{:04}-{:0width$}",
            prefix,
            year,
            suffix % SUFFIX_SPACE,
            width = SUFFIX_DIGITS
        ))
    }

    /// Draw a number with a uniformly random suffix
    pub fn generate<R: Rng + ?Sized>(prefix: &str, year: i32, rng: &mut R) -> Self {
        Self::new(prefix, year, rng.gen_range(0..SUFFIX_SPACE))
    }

    /// Parse and validate a patient number typed or stored elsewhere
    pub fn parse(value: &str) -> HmsResult<Self> {
        let value = value.trim();
        validate_patient_number(value).into_result()?;
        Ok(PatientNumber(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }

    pub fn year(&self) -> Option<i32> {
        self.0.split('-').nth(1).and_then(|y| y.parse().ok())
    }

    pub fn suffix(&self) -> Option<u32> {
        self.0.split('-').nth(2).and_then(|s| s.parse().ok())
    }
}

impl AsRef<str> for PatientNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate the `<PREFIX>-<year>-<5 digits>` shape
pub fn validate_patient_number(value: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if value.is_empty() {
        result.add_error("patient_number", "Patient number is required", ValidationErrorCode::Required);
        return result;
    }

    let parts: Vec<&str> = value.split('-').collect();
    if parts.len() != 3 {
        result.add_error(
            "patient_number",
            "Patient number must look like HMS-2025-00001",
            ValidationErrorCode::InvalidFormat,
        );
        return result;
    }

    let (prefix, year, suffix) = (parts[0], parts[1], parts[2]);
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        result.add_error(
            "patient_number",
            "Prefix must be uppercase letters or digits",
            ValidationErrorCode::InvalidCharacters,
        );
    }
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        result.add_error("patient_number", "Year must have 4 digits", ValidationErrorCode::InvalidFormat);
    }
    if suffix.len() != SUFFIX_DIGITS || !suffix.chars().all(|c| c.is_ascii_digit()) {
        result.add_error("patient_number", "Suffix must have 5 digits", ValidationErrorCode::InvalidFormat);
    }

    result
}

/// Registration form fields
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NewPatient {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact_number: String,
    pub address: String,
}

impl NewPatient {
    /// Copy with surrounding whitespace removed from every text field
    pub fn trimmed(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            contact_number: self.contact_number.trim().to_string(),
            address: self.address.trim().to_string(),
            ..self
        }
    }
}

/// Insert shape for `patients`; `id` and `created_at` are left to the store
#[derive(Clone, Debug, Serialize)]
pub struct PatientInsert<'a> {
    pub patient_number: &'a PatientNumber,
    #[serde(flatten)]
    pub fields: &'a NewPatient,
}

/// Earliest date of birth accepted at registration
pub fn earliest_date_of_birth() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Validate a registration form against today's date
pub fn validate_new_patient(patient: &NewPatient, today: NaiveDate) -> ValidationResult {
    let mut result = validate_required_text("full_name", "Full name", &patient.full_name);
    result.merge(validate_contact_number(&patient.contact_number));
    result.merge(validate_required_text("address", "Address", &patient.address));

    if patient.date_of_birth > today {
        result.add_error(
            "date_of_birth",
            "Date of birth cannot be in the future",
            ValidationErrorCode::OutOfRange,
        );
    } else if patient.date_of_birth < earliest_date_of_birth() {
        result.add_error(
            "date_of_birth",
            "Date of birth must be on or after 1900-01-01",
            ValidationErrorCode::OutOfRange,
        );
    }

    result
}

/// Phone numbers: digits plus common separators, at least one digit
pub fn validate_contact_number(value: &str) -> ValidationResult {
    let mut result = validate_required_text("contact_number", "Contact number", value);
    if !result.is_valid() {
        return result;
    }

    let value = value.trim();
    if !value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'))
    {
        result.add_error(
            "contact_number",
            "Contact number can only contain digits, spaces and + - ( ) .",
            ValidationErrorCode::InvalidCharacters,
        );
    } else if !value.chars().any(|c| c.is_ascii_digit()) {
        result.add_error(
            "contact_number",
            "Contact number must contain digits",
            ValidationErrorCode::InvalidFormat,
        );
    }

    result
}

/// Columns a patient may change after registration
pub const MUTABLE_FIELDS: &[&str] = &["full_name", "contact_number", "address"];

/// Columns fixed at registration
pub const IMMUTABLE_FIELDS: &[&str] = &["id", "patient_number", "date_of_birth", "gender", "created_at"];

/// Partial update of a patient's contact information
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContactUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactUpdate {
    /// Build a patch from loosely-typed input, naming any immutable or unknown field
    pub fn from_json(value: &Value) -> HmsResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| HmsError::validation("contact update must be a JSON object"))?;

        let mut result = ValidationResult::new();
        for field in object.keys() {
            if IMMUTABLE_FIELDS.contains(&field.as_str()) {
                result.add_error(
                    field,
                    "Field cannot be changed after registration",
                    ValidationErrorCode::Immutable,
                );
            } else if !MUTABLE_FIELDS.contains(&field.as_str()) {
                result.add_error(field, "Unknown field", ValidationErrorCode::UnknownField);
            }
        }
        result.into_result()?;

        let update: ContactUpdate = serde_json::from_value(value.clone())
            .map_err(|e| HmsError::validation(format!("invalid contact update: {}", e)))?;
        Ok(update.trimmed())
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.contact_number.is_none() && self.address.is_none()
    }

    pub fn trimmed(self) -> Self {
        Self {
            full_name: self.full_name.map(|v| v.trim().to_string()),
            contact_number: self.contact_number.map(|v| v.trim().to_string()),
            address: self.address.map(|v| v.trim().to_string()),
        }
    }

    /// Names of the columns this patch touches
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.full_name.is_some() {
            fields.push("full_name");
        }
        if self.contact_number.is_some() {
            fields.push("contact_number");
        }
        if self.address.is_some() {
            fields.push("address");
        }
        fields
    }
}

/// Validate a contact update: at least one field, none of them blank
pub fn validate_contact_update(update: &ContactUpdate) -> ValidationResult {
    let mut result = ValidationResult::new();

    if update.is_empty() {
        result.add_error(
            "contact_update",
            "At least one of full name, contact number or address is required",
            ValidationErrorCode::Required,
        );
        return result;
    }

    if let Some(full_name) = &update.full_name {
        result.merge(validate_required_text("full_name", "Full name", full_name));
    }
    if let Some(contact_number) = &update.contact_number {
        result.merge(validate_contact_number(contact_number));
    }
    if let Some(address) = &update.address {
        result.merge(validate_required_text("address", "Address", address));
    }

    result
}
