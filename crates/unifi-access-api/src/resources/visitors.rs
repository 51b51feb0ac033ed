// Visitor endpoints
//
// CRUD on `/visitors` plus credential assignment (PIN, NFC card).

use serde_json::json;
use tracing::debug;

use super::{ListParams, require_id};
use crate::client::AccessClient;
use crate::error::Error;
use crate::models::credential::validate_pin;
use crate::models::{NewNfcCard, NewVisitor, NfcCard, Visitor, VisitorUpdate};

impl AccessClient {
    /// List visitors, one page at a time.
    ///
    /// `GET /visitors?limit={limit}&offset={offset}`
    pub async fn list_visitors(&self, params: ListParams) -> Result<Vec<Visitor>, Error> {
        debug!(limit = params.limit, offset = params.offset, "listing visitors");
        self.get(&["visitors"], &params.query()).await
    }

    /// `GET /visitors/{id}`
    pub async fn get_visitor(&self, id: &str) -> Result<Visitor, Error> {
        require_id("visitor", id)?;
        self.get(&["visitors", id], &[]).await
    }

    /// Register a visitor. Fails locally if a name is blank or the visit
    /// window is empty or inverted.
    ///
    /// `POST /visitors`
    pub async fn create_visitor(&self, visitor: &NewVisitor) -> Result<Visitor, Error> {
        visitor.validate()?;
        debug!(
            first_name = %visitor.first_name,
            last_name = %visitor.last_name,
            "creating visitor"
        );
        self.post(&["visitors"], visitor).await
    }

    /// Change the given fields of a visitor; unset fields are untouched.
    ///
    /// `PUT /visitors/{id}`
    pub async fn update_visitor(&self, id: &str, update: &VisitorUpdate) -> Result<Visitor, Error> {
        require_id("visitor", id)?;
        update.validate()?;
        debug!(visitor_id = id, "updating visitor");
        self.put(&["visitors", id], update).await
    }

    /// `DELETE /visitors/{id}`
    pub async fn delete_visitor(&self, id: &str) -> Result<(), Error> {
        require_id("visitor", id)?;
        debug!(visitor_id = id, "deleting visitor");
        self.delete(&["visitors", id]).await
    }

    /// Assign a 4-8 digit PIN, replacing any existing one.
    ///
    /// `PUT /visitors/{id}/pin_codes` with `{"pin_code": "..."}`
    pub async fn set_visitor_pin(&self, id: &str, pin: &str) -> Result<(), Error> {
        require_id("visitor", id)?;
        validate_pin(pin)?;
        debug!(visitor_id = id, "assigning visitor PIN");
        self.put_no_response(&["visitors", id, "pin_codes"], &json!({ "pin_code": pin }))
            .await
    }

    /// Enroll an NFC card for a visitor.
    ///
    /// `POST /visitors/{id}/nfc-cards`
    pub async fn add_visitor_nfc_card(
        &self,
        id: &str,
        card: &NewNfcCard,
    ) -> Result<NfcCard, Error> {
        require_id("visitor", id)?;
        card.validate()?;
        debug!(visitor_id = id, "enrolling visitor NFC card");
        self.post(&["visitors", id, "nfc-cards"], card).await
    }
}
