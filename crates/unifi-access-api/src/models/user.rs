// ── User types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::{NfcCard, PinCode};
use super::empty_as_none;
use crate::error::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Pending,
    Deactivated,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A permanent user (employee, resident) of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(
        default,
        rename = "user_email",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub employee_number: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_policy_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nfc_cards: Vec<NfcCard>,
    #[serde(default, rename = "pin_code", skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinCode>,
    #[serde(
        default,
        rename = "onboard_time",
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub onboarded_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Request body for `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "user_email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_policy_ids: Vec<String>,
    #[serde(
        rename = "onboard_time",
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub onboarded_at: Option<DateTime<Utc>>,
}

impl NewUser {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
            employee_number: None,
            access_policy_ids: Vec::new(),
            onboarded_at: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_employee_number(mut self, number: impl Into<String>) -> Self {
        self.employee_number = Some(number.into());
        self
    }

    pub fn with_access_policy(mut self, policy_id: impl Into<String>) -> Self {
        self.access_policy_ids.push(policy_id.into());
        self
    }

    pub fn with_onboard_time(mut self, at: DateTime<Utc>) -> Self {
        self.onboarded_at = Some(at);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(Error::invalid("first_name and last_name must not be empty"));
        }
        Ok(())
    }
}
