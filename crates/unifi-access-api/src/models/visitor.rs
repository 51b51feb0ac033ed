// ── Visitor types ──
//
// Visitors are time-bounded guests. Timestamps travel as Unix seconds
// (`start_time`, `end_time`, `create_time`); contact and note fields use
// the controller's names (`mobile_phone`, `remarks`, `inviter_id`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::credential::{NfcCard, PinCode};
use super::{ResourceRef, ResourceType, empty_as_none, ids_of};
use crate::error::Error;

/// Server-side lifecycle state of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitorStatus {
    Upcoming,
    Visiting,
    Visited,
    Active,
    Cancelled,
    NoVisit,
    #[serde(other)]
    Unknown,
}

/// A visitor as returned by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        rename = "mobile_phone",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    /// Missing or zero on the wire reads as the time of parsing.
    #[serde(
        rename = "start_time",
        default = "Utc::now",
        deserialize_with = "seconds_or_now",
        serialize_with = "chrono::serde::ts_seconds::serialize"
    )]
    pub start_date: DateTime<Utc>,
    #[serde(
        rename = "end_time",
        default = "Utc::now",
        deserialize_with = "seconds_or_now",
        serialize_with = "chrono::serde::ts_seconds::serialize"
    )]
    pub end_date: DateTime<Utc>,
    #[serde(
        default,
        rename = "remarks",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(
        default,
        rename = "visitor_company",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub company: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub visit_reason: Option<String>,
    #[serde(
        default,
        rename = "inviter_id",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub sponsor_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VisitorStatus>,
    #[serde(default, rename = "pin_code", skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinCode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nfc_cards: Vec<NfcCard>,
    /// Doors and door groups this visitor may open.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRef>,
    #[serde(
        default,
        rename = "create_time",
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Visitor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the visit window contains the current time.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Whether the visit window (inclusive) contains `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    pub fn has_pin(&self) -> bool {
        self.pin.is_some()
    }

    pub fn door_group_ids(&self) -> Vec<&str> {
        ids_of(&self.resources, ResourceType::DoorGroup, &[])
    }

    pub fn door_ids(&self) -> Vec<&str> {
        ids_of(&self.resources, ResourceType::Door, &[])
    }
}

/// Unix seconds, with `null` and `0` meaning "now".
fn seconds_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        None | Some(0) => Ok(Utc::now()),
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}"))),
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// Request body for `POST /visitors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVisitor {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "start_time", with = "chrono::serde::ts_seconds")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "end_time", with = "chrono::serde::ts_seconds")]
    pub end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "mobile_phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "remarks", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "visitor_company", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_reason: Option<String>,
    #[serde(rename = "inviter_id", skip_serializing_if = "Option::is_none")]
    pub sponsor_user_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRef>,
}

impl NewVisitor {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            start_date,
            end_date,
            email: None,
            phone: None,
            notes: None,
            company: None,
            visit_reason: None,
            sponsor_user_id: None,
            resources: Vec::new(),
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

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_visit_reason(mut self, reason: impl Into<String>) -> Self {
        self.visit_reason = Some(reason.into());
        self
    }

    pub fn with_sponsor(mut self, user_id: impl Into<String>) -> Self {
        self.sponsor_user_id = Some(user_id.into());
        self
    }

    /// Grant access to a door group for the visit window.
    pub fn with_door_group(mut self, id: impl Into<String>) -> Self {
        self.resources.push(ResourceRef::door_group(id));
        self
    }

    pub fn with_door(mut self, id: impl Into<String>) -> Self {
        self.resources.push(ResourceRef::door(id));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        require_name("first_name", &self.first_name)?;
        require_name("last_name", &self.last_name)?;
        check_window(self.start_date, self.end_date)
    }
}

/// Partial update for `PUT /visitors/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisitorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "mobile_phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(
        rename = "start_time",
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        rename = "end_time",
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "remarks", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "visitor_company", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_reason: Option<String>,
    #[serde(rename = "inviter_id", skip_serializing_if = "Option::is_none")]
    pub sponsor_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceRef>>,
}

impl VisitorUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::invalid("visitor update sets no fields"));
        }
        if let Some(ref name) = self.first_name {
            require_name("first_name", name)?;
        }
        if let Some(ref name) = self.last_name {
            require_name("last_name", name)?;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            check_window(start, end)?;
        }
        Ok(())
    }
}

fn require_name(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), Error> {
    if end <= start {
        return Err(Error::invalid(format!(
            "end_date ({end}) must be after start_date ({start})"
        )));
    }
    Ok(())
}
