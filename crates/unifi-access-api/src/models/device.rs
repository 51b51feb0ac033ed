// ── Device types ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::empty_as_none;

/// Hardware class, derived from the controller's model string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    AccessHub,
    DoorReader,
    DoorLock,
    Controller,
    Camera,
    Other,
}

impl DeviceType {
    /// Classify a model string such as `UAH`, `UA-G2-PRO` or `UDM-PRO`.
    pub fn from_model(model: &str) -> Self {
        let model = model.to_ascii_uppercase();
        if model.starts_with("UAH") || model.contains("HUB") {
            Self::AccessHub
        } else if model.contains("CAMERA") || model.starts_with("UVC") {
            Self::Camera
        } else if model.contains("LOCK") {
            Self::DoorLock
        } else if model.starts_with("UDM") || model.starts_with("UCK") || model.starts_with("UCG")
        {
            Self::Controller
        } else if model.starts_with("UA-")
            || ["READER", "G2", "G3", "LITE", "ULTRA"]
                .iter()
                .any(|tag| model.contains(tag))
        {
            Self::DoorReader
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AccessHub => "access hub",
            Self::DoorReader => "door reader",
            Self::DoorLock => "door lock",
            Self::Controller => "controller",
            Self::Camera => "camera",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    /// User-assigned name; preferred over `name` for display.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub alias: Option<String>,
    /// Raw model string (`UAH`, `UA-G2-PRO`, ...).
    #[serde(default, rename = "type")]
    pub model: String,
    /// Door or floor the device is mounted at.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_id: Option<String>,
}

impl Device {
    pub fn device_type(&self) -> DeviceType {
        DeviceType::from_model(&self.model)
    }

    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn location(&self) -> Option<&str> {
        self.location_id.as_deref()
    }
}

/// `GET /devices` returns either a flat list or one list per hub.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DeviceListing {
    Nested(Vec<Vec<Device>>),
    Flat(Vec<Device>),
}

impl DeviceListing {
    pub(crate) fn flatten(self) -> Vec<Device> {
        match self {
            Self::Nested(groups) => groups.into_iter().flatten().collect(),
            Self::Flat(devices) => devices,
        }
    }
}
