//! Filter-expression compiler and paginated query executor for dynaquery.
//!
//! A caller describes a query as [`QueryOptions`]: a partition key, an
//! optional sort key, and an optional [`Where`] tree of conditions and nested
//! groups. [`QueryExecutor`] compiles it into one native
//! [`QueryInput`](dynaquery_model::QueryInput) and drives a [`QueryBackend`]
//! page by page until the results are exhausted, the backend fails, or the
//! [`QueryContext`] is cancelled.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod expression;
pub mod filter;
pub mod key;
pub mod query;

pub use backend::QueryBackend;
pub use config::QueryConfig;
pub use context::QueryContext;
pub use error::{CancelReason, QueryError};
pub use filter::{LogicalOperator, Where, WhereCondition, WhereOperator};
pub use key::QueryKeyValue;
pub use query::{QueryExecutor, QueryOptions};
