// Access policy endpoints

use tracing::debug;

use super::{ListParams, require_id};
use crate::client::AccessClient;
use crate::error::Error;
use crate::models::{AccessPolicy, NewAccessPolicy};

impl AccessClient {
    /// `GET /access_policies?limit={limit}&offset={offset}`
    pub async fn list_access_policies(
        &self,
        params: ListParams,
    ) -> Result<Vec<AccessPolicy>, Error> {
        debug!(limit = params.limit, offset = params.offset, "listing access policies");
        self.get(&["access_policies"], &params.query()).await
    }

    /// `GET /access_policies/{id}`
    pub async fn get_access_policy(&self, id: &str) -> Result<AccessPolicy, Error> {
        require_id("access policy", id)?;
        self.get(&["access_policies", id], &[]).await
    }

    /// `POST /access_policies`
    pub async fn create_access_policy(
        &self,
        policy: &NewAccessPolicy,
    ) -> Result<AccessPolicy, Error> {
        policy.validate()?;
        debug!(name = %policy.name, "creating access policy");
        self.post(&["access_policies"], policy).await
    }
}
