//! Typed per-embed configuration.
//!
//! Settings arrive as a JSON document. They are parsed into an
//! industry-tagged profile plus an open map of custom booking-form fields, and
//! validated once at the storage boundary via [`EmbedSettings::from_value`].

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Malformed settings document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid {industry} profile: {reason}")]
    InvalidProfile { industry: &'static str, reason: String },

    #[error("Invalid custom field '{key}': {reason}")]
    InvalidCustomField { key: String, reason: String },

    #[error("Missing required field '{0}'")]
    MissingAnswer(String),

    #[error("Invalid answer for '{key}': {reason}")]
    InvalidAnswer { key: String, reason: String },
}

/// Industry-specific part of the settings, keyed by the `industry` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "industry", rename_all = "snake_case")]
pub enum IndustryProfile {
    Salon {
        #[serde(default)]
        stylists: Vec<String>,
    },
    Medical {
        #[serde(default)]
        requires_insurance: bool,
        #[serde(default)]
        practitioners: Vec<String>,
    },
    Fitness {
        max_class_size: u32,
    },
    Consulting {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meeting_url: Option<String>,
    },
    General,
}

impl IndustryProfile {
    pub fn name(&self) -> &'static str {
        match self {
            IndustryProfile::Salon { .. } => "salon",
            IndustryProfile::Medical { .. } => "medical",
            IndustryProfile::Fitness { .. } => "fitness",
            IndustryProfile::Consulting { .. } => "consulting",
            IndustryProfile::General => "general",
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |reason: &str| SettingsError::InvalidProfile {
            industry: self.name(),
            reason: reason.to_string(),
        };
        match self {
            IndustryProfile::Salon { stylists } if stylists.iter().any(|s| s.trim().is_empty()) => {
                Err(invalid("stylist names must not be blank"))
            }
            IndustryProfile::Medical { practitioners, .. }
                if practitioners.iter().any(|p| p.trim().is_empty()) =>
            {
                Err(invalid("practitioner names must not be blank"))
            }
            IndustryProfile::Fitness { max_class_size: 0 } => {
                Err(invalid("max_class_size must be at least 1"))
            }
            IndustryProfile::Consulting { meeting_url: Some(url) }
                if !(url.starts_with("https://") || url.starts_with("http://")) =>
            {
                Err(invalid("meeting_url must be an http(s) URL"))
            }
            _ => Ok(()),
        }
    }
}

/// Input type of a custom booking-form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Choice { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedSettings {
    #[serde(flatten)]
    pub industry: IndustryProfile,
    /// IANA timezone the embed's wall-clock times are expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Booking types customers may pick. Empty means every active type.
    #[serde(default)]
    pub allowed_booking_types: Vec<Uuid>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, CustomField>,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            industry: IndustryProfile::General,
            timezone: default_timezone(),
            allowed_booking_types: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }
}

impl EmbedSettings {
    /// Parse and validate a settings document. `null` yields the defaults.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let settings: EmbedSettings = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        parse_timezone(&self.timezone)?;
        self.industry.validate()?;

        for (key, field) in &self.custom_fields {
            let invalid = |reason: &str| SettingsError::InvalidCustomField {
                key: key.clone(),
                reason: reason.to_string(),
            };
            if !is_field_key(key) {
                return Err(invalid("keys must be lowercase snake_case"));
            }
            if field.label.trim().is_empty() {
                return Err(invalid("label must not be blank"));
            }
            if let FieldKind::Choice { options } = &field.kind {
                if options.is_empty() {
                    return Err(invalid("choice fields need at least one option"));
                }
            }
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, SettingsError> {
        parse_timezone(&self.timezone)
    }

    pub fn allows_booking_type(&self, id: Uuid) -> bool {
        self.allowed_booking_types.is_empty() || self.allowed_booking_types.contains(&id)
    }

    /// Check a customer's answers against the configured custom fields.
    pub fn validate_answers(&self, answers: &BTreeMap<String, Value>) -> Result<(), SettingsError> {
        for key in answers.keys() {
            if !self.custom_fields.contains_key(key) {
                return Err(SettingsError::InvalidAnswer {
                    key: key.clone(),
                    reason: "no such field".to_string(),
                });
            }
        }

        for (key, field) in &self.custom_fields {
            let answer = match answers.get(key) {
                Some(Value::Null) | None if field.required => {
                    return Err(SettingsError::MissingAnswer(key.clone()));
                }
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };
            let ok = match &field.kind {
                FieldKind::Text => answer
                    .as_str()
                    .is_some_and(|s| !field.required || !s.trim().is_empty()),
                FieldKind::Number => answer.is_number(),
                FieldKind::Boolean => answer.is_boolean(),
                FieldKind::Choice { options } => answer
                    .as_str()
                    .is_some_and(|s| options.iter().any(|o| o == s)),
            };
            if !ok {
                return Err(SettingsError::InvalidAnswer {
                    key: key.clone(),
                    reason: format!("does not match field kind {:?}", field.kind),
                });
            }
        }
        Ok(())
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, SettingsError> {
    name.parse::<Tz>()
        .map_err(|_| SettingsError::InvalidTimezone(name.to_string()))
}

fn is_field_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
