// ── Credentials attached to users and visitors ──

use serde::{Deserialize, Serialize};

use super::empty_as_none;
use crate::error::Error;

/// NFC card bound to a user or visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfcCard {
    pub id: String,
    /// Card number; older firmware calls this `token`.
    #[serde(alias = "token")]
    pub card_number: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_code: Option<String>,
}

/// PIN credential. The controller only ever returns a hashed token,
/// never the digits themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinCode {
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<String>,
}

/// Request body for enrolling an NFC card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNfcCard {
    pub card_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_code: Option<String>,
}

impl NewNfcCard {
    pub fn new(card_number: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            facility_code: None,
        }
    }

    pub fn with_facility_code(mut self, code: impl Into<String>) -> Self {
        self.facility_code = Some(code.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.card_number.trim().is_empty() {
            return Err(Error::invalid("card_number must not be empty"));
        }
        Ok(())
    }
}

/// A PIN must be 4 to 8 ASCII digits.
pub(crate) fn validate_pin(pin: &str) -> Result<(), Error> {
    if !(4..=8).contains(&pin.len()) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid("pin must be 4 to 8 digits"));
    }
    Ok(())
}
