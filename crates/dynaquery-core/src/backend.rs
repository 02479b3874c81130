//! The seam between the query executor and a concrete store client.

use async_trait::async_trait;
use dynaquery_model::{Cursor, DynamoDBError, QueryInput, QueryPage};

/// Fetches single pages of a `Query`.
///
/// Implementations are shared read-only across concurrent queries and must
/// be safe for concurrent use. Retry policy, if any, belongs here rather than
/// in the executor.
///
/// Uses `#[async_trait]` so the executor can hold it as `Arc<dyn QueryBackend>`.
#[async_trait]
pub trait QueryBackend: std::fmt::Debug + Send + Sync {
    /// Fetch the page starting at `cursor`, or the first page when `None`.
    async fn query_page(
        &self,
        input: &QueryInput,
        cursor: Option<&Cursor>,
    ) -> Result<QueryPage, DynamoDBError>;
}
