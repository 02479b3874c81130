//! Opaque pagination cursor.
//!
//! A cursor is whatever string the backend hands back to mark where the
//! next page resumes. The query core only threads it between fetches. The
//! helpers here are for backends that carry a `LastEvaluatedKey` map: they
//! encode it as URL-safe base64 of its DynamoDB JSON and decode it back into
//! an `ExclusiveStartKey`.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;
use crate::error::DynamoDBError;

/// An opaque continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a backend-issued token verbatim.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode a `LastEvaluatedKey` into a cursor.
    ///
    /// Returns `None` for an empty key, which DynamoDB uses to signal that
    /// there are no further pages.
    #[must_use]
    pub fn from_last_evaluated_key(key: &HashMap<String, AttributeValue>) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        // Sorted so the same key always yields the same cursor.
        let sorted: std::collections::BTreeMap<_, _> = key.iter().collect();
        let json = serde_json::to_vec(&sorted).ok()?;
        Some(Self(
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json),
        ))
    }

    /// Decode a cursor produced by [`Cursor::from_last_evaluated_key`] back
    /// into an `ExclusiveStartKey`.
    pub fn to_exclusive_start_key(&self) -> Result<HashMap<String, AttributeValue>, DynamoDBError> {
        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|e| {
                DynamoDBError::validation(format!("cursor is not valid base64: {e}")).with_source(e)
            })?;
        let key: HashMap<String, AttributeValue> = serde_json::from_slice(&json).map_err(|e| {
            DynamoDBError::validation(format!("cursor does not contain a key: {e}")).with_source(e)
        })?;
        if key.is_empty() {
            return Err(DynamoDBError::validation("cursor contains an empty key"));
        }
        Ok(key)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}
