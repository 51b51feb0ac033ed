// Door endpoints (read-only)

use tracing::debug;

use super::{ListParams, require_id};
use crate::client::AccessClient;
use crate::error::Error;
use crate::models::Door;

impl AccessClient {
    /// `GET /doors?limit={limit}&offset={offset}`
    pub async fn list_doors(&self, params: ListParams) -> Result<Vec<Door>, Error> {
        debug!(limit = params.limit, offset = params.offset, "listing doors");
        self.get(&["doors"], &params.query()).await
    }

    /// `GET /doors/{id}`
    pub async fn get_door(&self, id: &str) -> Result<Door, Error> {
        require_id("door", id)?;
        self.get(&["doors", id], &[]).await
    }
}
