// ── Door and door group types ──

use serde::{Deserialize, Serialize};

use super::{ResourceRef, ResourceType, default_true, empty_as_none, ids_of};
use crate::error::Error;

/// Lock relay state reported by the hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Lock,
    Unlock,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Door position sensor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorPosition {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "close")]
    Close,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub id: String,
    pub name: String,
    /// Name including site/building/floor, e.g. `"HQ - 1F - Main"`.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub floor_id: Option<String>,
    #[serde(
        default,
        rename = "type",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub door_type: Option<String>,
    #[serde(default, rename = "door_lock_relay_status")]
    pub lock_status: LockStatus,
    #[serde(default, rename = "door_position_status")]
    pub position: DoorPosition,
    /// Whether the door is wired to a hub. Missing means bound.
    #[serde(default = "default_true", rename = "is_bind_hub")]
    pub bound_to_hub: bool,
}

impl Door {
    pub fn is_locked(&self) -> bool {
        self.lock_status == LockStatus::Lock
    }

    /// A door is reachable only while its hub binding holds.
    pub fn is_online(&self) -> bool {
        self.bound_to_hub
    }

    /// Best human-readable location: full name, then floor id, then name.
    pub fn location(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.floor_id.as_deref())
            .unwrap_or(&self.name)
    }
}

// ── Door groups ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorGroup {
    pub id: String,
    pub name: String,
    #[serde(
        default,
        rename = "type",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRef>,
    /// Flat form some controllers return instead of `resources`.
    #[serde(default, rename = "door_ids", skip_serializing_if = "Vec::is_empty")]
    pub listed_door_ids: Vec<String>,
}

impl DoorGroup {
    /// Member doors from both `resources` and `door_ids`.
    pub fn door_ids(&self) -> Vec<&str> {
        ids_of(&self.resources, ResourceType::Door, &self.listed_door_ids)
    }
}

/// Request body for `POST /door_groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDoorGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub door_ids: Vec<String>,
}

impl NewDoorGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            door_ids: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_door(mut self, door_id: impl Into<String>) -> Self {
        self.door_ids.push(door_id.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("door group name must not be empty"));
        }
        if self.door_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(Error::invalid("door ids must not be empty"));
        }
        Ok(())
    }
}
