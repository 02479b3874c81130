//! One page of `Query` results.

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;
use crate::cursor::Cursor;

/// A single page returned by a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryPage {
    /// Items in the order the backend returned them.
    #[serde(default)]
    pub items: Vec<Item>,

    /// Where the next page resumes. `None` means the result set is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

impl QueryPage {
    /// A page of items and the cursor of the next page, if any.
    #[must_use]
    pub fn new(items: Vec<Item>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }
}
