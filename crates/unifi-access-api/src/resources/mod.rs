// Developer API endpoint methods
//
// One file per resource family, each an inherent `impl AccessClient`
// block. Methods validate their input before any request is made and
// return typed models with the envelope already stripped.

mod devices;
mod door_groups;
mod doors;
mod policies;
mod users;
mod visitors;

use crate::error::Error;

/// `limit` / `offset` query parameters, passed through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub limit: u32,
    pub offset: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

impl ListParams {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// The page after this one.
    pub fn next_page(self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            ..self
        }
    }

    pub(crate) fn query(self) -> [(&'static str, String); 2] {
        [
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ]
    }
}

/// Reject blank ids before they turn into `GET /visitors/`.
pub(crate) fn require_id(kind: &str, id: &str) -> Result<(), Error> {
    if id.trim().is_empty() {
        return Err(Error::invalid(format!("{kind} id must not be empty")));
    }
    Ok(())
}
