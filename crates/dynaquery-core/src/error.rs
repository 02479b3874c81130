//! Error taxonomy for building and running queries.
//!
//! Validation and compile errors are produced locally before any backend
//! contact and are deterministic for a given [`QueryOptions`](crate::QueryOptions).
//! Execution errors come from the backend or the caller's context.

use std::fmt;

use dynaquery_model::DynamoDBError;

use crate::filter::WhereOperator;

/// Why a query stopped before exhausting its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled the context.
    Cancelled,
    /// The context deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "context canceled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Errors returned by the query compilers and executor.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// `Table` is empty.
    #[error("table not set")]
    TableNotSet,

    /// `Index` is empty.
    #[error("index not set")]
    IndexNotSet,

    /// Partition is missing, or its key or value is unset.
    #[error("partition not set")]
    PartitionNotSet,

    /// The partition key only supports equality.
    #[error("unsupported partition key operator: {0}")]
    UnsupportedPartitionOperator(WhereOperator),

    /// A filter node has neither conditions nor groups.
    #[error("no conditions provided")]
    EmptyWhereClause,

    /// An operator spelling that is not part of the operator set.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A sort key operator that key conditions do not support yet. Empty
    /// when the sort key names no operator.
    #[error("unsupported sort key operator: {0}")]
    UnsupportedSortOperator(String),

    /// `CONTAINS` or `BEGINS_WITH` without an operand.
    #[error("{operator} on `{field}` requires a Value")]
    MissingOperand {
        /// Field the condition applies to.
        field: String,
        /// The string function that lacks its operand.
        operator: WhereOperator,
    },

    /// `BETWEEN` without both bounds.
    #[error("BETWEEN on `{field}` requires both Value and Value2")]
    MissingRangeBound {
        /// Field the condition applies to.
        field: String,
    },

    /// `IN` without operands.
    #[error("IN on `{field}` requires a non-empty Values list")]
    EmptyInOperands {
        /// Field the condition applies to.
        field: String,
    },

    /// An attribute name or document path that cannot be referenced.
    #[error("invalid attribute path: `{0}`")]
    InvalidAttributePath(String),

    /// The `Where` tree failed to compile.
    #[error("failed to build filter expression: {0}")]
    BuildFilterExpressionFailed(#[source] Box<QueryError>),

    /// The backend failed while fetching a page. Items from earlier pages are
    /// discarded.
    #[error("failed to perform query on page {page} ({discarded} items discarded): {}", .source.code)]
    QueryFailed {
        /// One-based number of the page that failed.
        page: usize,
        /// Items already accumulated from earlier pages.
        discarded: usize,
        /// Backend error.
        #[source]
        source: DynamoDBError,
    },

    /// The caller's context stopped the query between pages.
    #[error("query stopped: {0}")]
    Cancelled(CancelReason),
}

impl QueryError {
    /// Input validation failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::TableNotSet | Self::IndexNotSet | Self::PartitionNotSet
        )
    }

    /// Failures compiling key conditions, filters or projections.
    #[must_use]
    pub fn is_compile(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPartitionOperator(_)
                | Self::EmptyWhereClause
                | Self::UnsupportedOperator(_)
                | Self::UnsupportedSortOperator(_)
                | Self::MissingRangeBound { .. }
                | Self::MissingOperand { .. }
                | Self::EmptyInOperands { .. }
                | Self::InvalidAttributePath(_)
                | Self::BuildFilterExpressionFailed(_)
        )
    }

    /// Failures raised while pages were being fetched.
    #[must_use]
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::QueryFailed { .. } | Self::Cancelled(_))
    }

    /// A page failed with an error that may clear up on retry, such as
    /// throttling or a dropped connection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::QueryFailed { source, .. } if source.code.is_transient())
    }
}
