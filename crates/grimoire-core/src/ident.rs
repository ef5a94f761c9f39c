//! Entity identifier validation.
//!
//! Every handler that receives an id from a path parameter or a request body
//! runs it through this module before the id reaches a store lookup. The
//! canonical encoding is the UUID text form (hyphenated or simple,
//! case-insensitive); anything else — empty strings included — is rejected
//! with [`Error::InvalidId`].

use uuid::Uuid;

use crate::error::{Error, Result};

/// Parse a candidate entity id, rejecting malformed values.
pub fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| Error::InvalidId(value.to_string()))
}

/// Whether `value` is a well-formed entity identifier.
pub fn is_valid_id(value: &str) -> bool {
    parse_id(value).is_ok()
}
