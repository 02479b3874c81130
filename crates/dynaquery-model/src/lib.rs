//! DynamoDB wire types for dynaquery.
//!
//! These are the backend-native shapes the query core produces and consumes:
//! the typed [`AttributeValue`], the [`QueryInput`] request handed to a
//! backend, the [`QueryPage`] it returns, and the opaque [`Cursor`] threaded
//! between pages. All of them serialize to DynamoDB's JSON protocol.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod cursor;
pub mod error;
pub mod input;
pub mod output;

pub use attribute_value::{AttributeValue, Item};
pub use cursor::Cursor;
pub use error::{DynamoDBError, DynamoDBErrorCode};
pub use input::QueryInput;
pub use output::QueryPage;
