// User endpoints

use tracing::debug;

use super::{ListParams, require_id};
use crate::client::AccessClient;
use crate::error::Error;
use crate::models::{NewUser, User};

impl AccessClient {
    /// `GET /users?limit={limit}&offset={offset}`
    pub async fn list_users(&self, params: ListParams) -> Result<Vec<User>, Error> {
        debug!(limit = params.limit, offset = params.offset, "listing users");
        self.get(&["users"], &params.query()).await
    }

    /// `GET /users/{id}`
    pub async fn get_user(&self, id: &str) -> Result<User, Error> {
        require_id("user", id)?;
        self.get(&["users", id], &[]).await
    }

    /// `POST /users`
    pub async fn create_user(&self, user: &NewUser) -> Result<User, Error> {
        user.validate()?;
        debug!(
            first_name = %user.first_name,
            last_name = %user.last_name,
            "creating user"
        );
        self.post(&["users"], user).await
    }
}
