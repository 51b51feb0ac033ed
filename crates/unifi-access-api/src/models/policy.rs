// ── Access policy types ──

use serde::{Deserialize, Serialize};

use super::{ResourceRef, ResourceType, empty_as_none, ids_of};
use crate::error::Error;

/// Grants a set of doors and door groups, optionally on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRef>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule_id: Option<String>,
    #[serde(default, rename = "door_ids", skip_serializing_if = "Vec::is_empty")]
    pub listed_door_ids: Vec<String>,
    #[serde(
        default,
        rename = "door_group_ids",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub listed_door_group_ids: Vec<String>,
}

impl AccessPolicy {
    /// Granted door groups, from `resources` and the flat `door_group_ids`.
    pub fn door_group_ids(&self) -> Vec<&str> {
        ids_of(
            &self.resources,
            ResourceType::DoorGroup,
            &self.listed_door_group_ids,
        )
    }

    pub fn door_ids(&self) -> Vec<&str> {
        ids_of(&self.resources, ResourceType::Door, &self.listed_door_ids)
    }
}

/// Request body for `POST /access_policies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccessPolicy {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub door_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub door_group_ids: Vec<String>,
}

impl NewAccessPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            schedule_id: None,
            door_ids: Vec::new(),
            door_group_ids: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schedule(mut self, schedule_id: impl Into<String>) -> Self {
        self.schedule_id = Some(schedule_id.into());
        self
    }

    pub fn with_door(mut self, door_id: impl Into<String>) -> Self {
        self.door_ids.push(door_id.into());
        self
    }

    pub fn with_door_group(mut self, group_id: impl Into<String>) -> Self {
        self.door_group_ids.push(group_id.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("policy name must not be empty"));
        }
        let blank_ref = self
            .door_ids
            .iter()
            .chain(&self.door_group_ids)
            .any(|id| id.trim().is_empty());
        if blank_ref {
            return Err(Error::invalid("door and door group ids must not be empty"));
        }
        Ok(())
    }
}
