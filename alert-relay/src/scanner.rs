//! Pattern-based detection of sensitive-looking data in payload text.
//!
//! Two independent checks run in a fixed order. The email check runs first;
//! the phone check then either labels the text `phone` or, if the email
//! check already matched, upgrades the label to `email_and_phone`. Where the
//! matches sit in the text has no influence on the label.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[\w.-]+@[\w.-]+\.\w{2,4}\b").expect("email pattern is valid")
});

// International form with the 380 country code, or a 10 digit local number
// starting with 0.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?380\d{9}|\b0\d{9}\b").expect("phone pattern is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    None,
    Email,
    Phone,
    EmailAndPhone,
}

impl AlertType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertType::None => "none",
            AlertType::Email => "email",
            AlertType::Phone => "phone",
            AlertType::EmailAndPhone => "email_and_phone",
        }
    }

    pub fn is_alert(&self) -> bool {
        *self != AlertType::None
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(text: &str) -> AlertType {
    let mut alert_type = AlertType::None;

    if EMAIL_PATTERN.is_match(text) {
        alert_type = AlertType::Email;
    }

    if PHONE_PATTERN.is_match(text) {
        alert_type = match alert_type {
            AlertType::None => AlertType::Phone,
            _ => AlertType::EmailAndPhone,
        };
    }

    alert_type
}
