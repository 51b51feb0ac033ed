// Device endpoints (read-only)
//
// The controller groups devices per hub in some firmware versions, so
// the listing is flattened before it is returned.

use tracing::debug;

use super::{ListParams, require_id};
use crate::client::AccessClient;
use crate::error::Error;
use crate::models::Device;
use crate::models::device::DeviceListing;

impl AccessClient {
    /// `GET /devices?limit={limit}&offset={offset}`
    pub async fn list_devices(&self, params: ListParams) -> Result<Vec<Device>, Error> {
        debug!(limit = params.limit, offset = params.offset, "listing devices");
        let listing: DeviceListing = self.get(&["devices"], &params.query()).await?;
        Ok(listing.flatten())
    }

    /// `GET /devices/{id}`
    pub async fn get_device(&self, id: &str) -> Result<Device, Error> {
        require_id("device", id)?;
        self.get(&["devices", id], &[]).await
    }
}
