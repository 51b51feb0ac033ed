// Door group endpoints

use tracing::debug;

use super::{ListParams, require_id};
use crate::client::AccessClient;
use crate::error::Error;
use crate::models::{DoorGroup, NewDoorGroup};

impl AccessClient {
    /// `GET /door_groups?limit={limit}&offset={offset}`
    pub async fn list_door_groups(&self, params: ListParams) -> Result<Vec<DoorGroup>, Error> {
        debug!(limit = params.limit, offset = params.offset, "listing door groups");
        self.get(&["door_groups"], &params.query()).await
    }

    /// `GET /door_groups/{id}`
    pub async fn get_door_group(&self, id: &str) -> Result<DoorGroup, Error> {
        require_id("door group", id)?;
        self.get(&["door_groups", id], &[]).await
    }

    /// `POST /door_groups`
    pub async fn create_door_group(&self, group: &NewDoorGroup) -> Result<DoorGroup, Error> {
        group.validate()?;
        debug!(name = %group.name, doors = group.door_ids.len(), "creating door group");
        self.post(&["door_groups"], group).await
    }
}
