// Developer API data models
//
// Field names follow the controller's JSON. Optional fields use
// `#[serde(default)]` liberally because firmware versions disagree about
// which keys are present, and unknown keys are ignored. Empty strings in
// optional text fields are read as absent.

pub mod credential;
pub mod device;
pub mod door;
pub mod policy;
pub mod user;
pub mod visitor;

use serde::{Deserialize, Deserializer, Serialize};

pub use credential::{NewNfcCard, NfcCard, PinCode};
pub use device::{Device, DeviceType};
pub use door::{Door, DoorGroup, DoorPosition, LockStatus, NewDoorGroup};
pub use policy::{AccessPolicy, NewAccessPolicy};
pub use user::{NewUser, User, UserStatus};
pub use visitor::{NewVisitor, Visitor, VisitorStatus, VisitorUpdate};

// ── Resource references ──────────────────────────────────────────────

/// Kind of entity a [`ResourceRef`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Door,
    DoorGroup,
    #[serde(other)]
    Other,
}

/// Weak reference to a door or door group, by id only.
///
/// The controller owns referential integrity; nothing here checks that
/// the target exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub id: String,
}

impl ResourceRef {
    pub fn door(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceType::Door,
            id: id.into(),
        }
    }

    pub fn door_group(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceType::DoorGroup,
            id: id.into(),
        }
    }
}

/// Ids of every reference of the given kind, in listing order, followed
/// by any id from the flat `extra` list not already seen.
///
/// Responses carry references as `resources`, but some controllers echo
/// the create body back with flat `door_ids` / `door_group_ids` instead.
pub(crate) fn ids_of<'a>(
    resources: &'a [ResourceRef],
    kind: ResourceType,
    extra: &'a [String],
) -> Vec<&'a str> {
    let mut ids: Vec<&str> = resources
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.id.as_str())
        .collect();
    for id in extra {
        if !ids.contains(&id.as_str()) {
            ids.push(id);
        }
    }
    ids
}

// ── Serde helpers ────────────────────────────────────────────────────

/// Deserialize an optional string, treating `""` (and whitespace) as `None`.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

pub(crate) fn default_true() -> bool {
    true
}
