//! Query options and the paginated executor.
//!
//! [`QueryExecutor::query`] validates [`QueryOptions`], builds one native
//! [`QueryInput`], then fetches pages until the backend reports no further
//! cursor. Items are returned in page order, then backend order within each
//! page. Any failure aborts the query and discards what was accumulated.

use std::sync::Arc;

use dynaquery_model::{Cursor, Item, QueryInput, QueryPage};
use serde::Deserialize;
use tracing::{Level, debug, info, warn};

use crate::backend::QueryBackend;
use crate::config::QueryConfig;
use crate::context::QueryContext;
use crate::error::QueryError;
use crate::expression::{AttributePath, ExpressionBuilder};
use crate::filter::{Where, compile_where};
use crate::key::{QueryKeyValue, build_key_condition};

/// Everything needed to run one query against a secondary index.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOptions {
    /// Table name.
    #[serde(default)]
    pub table: String,
    /// Index name.
    #[serde(default)]
    pub index: String,
    /// Page size. Zero or negative uses [`QueryConfig::default_limit`].
    #[serde(default)]
    pub limit: i32,
    /// Where to resume a previous query. Empty means from the start.
    #[serde(default)]
    pub cursor: Option<Cursor>,
    /// Partition key equality.
    #[serde(default)]
    pub partition: Option<QueryKeyValue>,
    /// Optional sort key predicate.
    #[serde(default)]
    pub sort: Option<QueryKeyValue>,
    /// Optional filter applied after the key condition.
    #[serde(default, rename = "Where")]
    pub filter: Option<Where>,
    /// Attributes to return. Empty returns every attribute.
    #[serde(default)]
    pub projection: Vec<String>,
}

impl QueryOptions {
    /// Query `index` of `table` for items whose partition key equals `partition`.
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        index: impl Into<String>,
        partition: QueryKeyValue,
    ) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
            partition: Some(partition),
            ..Self::default()
        }
    }

    /// Set the sort key predicate.
    #[must_use]
    pub fn with_sort(mut self, sort: QueryKeyValue) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Where) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    /// Resume from `cursor`.
    #[must_use]
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Restrict the returned attributes.
    #[must_use]
    pub fn with_projection<S: Into<String>>(
        mut self,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.projection = attributes.into_iter().map(Into::into).collect();
        self
    }

    fn start_cursor(&self) -> Option<Cursor> {
        self.cursor
            .as_ref()
            .filter(|c| !c.as_str().is_empty())
            .cloned()
    }
}

#[derive(Debug)]
enum PageState {
    HasMore(Option<Cursor>),
    Exhausted,
}

/// Runs queries against a shared backend.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn QueryBackend>,
    config: QueryConfig,
}

impl QueryExecutor {
    /// Create an executor over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn QueryBackend>, config: QueryConfig) -> Self {
        Self {
            backend,
            config: config.normalized(),
        }
    }

    /// The executor configuration.
    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Validate `options` and build the native request.
    ///
    /// Fails on the first of: empty table, empty index, invalid key condition,
    /// filter compile error, invalid projection path. Nothing is sent to the
    /// backend.
    pub fn build_request(&self, options: &QueryOptions) -> Result<QueryInput, QueryError> {
        if options.table.is_empty() {
            return Err(QueryError::TableNotSet);
        }
        if options.index.is_empty() {
            return Err(QueryError::IndexNotSet);
        }
        let key = build_key_condition(options.partition.as_ref(), options.sort.as_ref())?;

        let filter = options
            .filter
            .as_ref()
            .map(compile_where)
            .transpose()
            .map_err(|e| QueryError::BuildFilterExpressionFailed(Box::new(e)))?;

        let projection = options
            .projection
            .iter()
            .map(|p| AttributePath::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = ExpressionBuilder::new();
        let key_condition_expression = builder.condition(key.condition());
        let filter_expression = filter.map(|f| builder.condition(&f));
        let projection_expression =
            (!projection.is_empty()).then(|| builder.projection(&projection));
        let attributes = builder.finish();

        let limit = if options.limit > 0 {
            options.limit
        } else {
            self.config.default_limit
        };

        Ok(QueryInput {
            table_name: options.table.clone(),
            index_name: Some(options.index.clone()),
            key_condition_expression,
            filter_expression,
            projection_expression,
            expression_attribute_names: attributes.names,
            expression_attribute_values: attributes.values,
            limit: Some(limit),
        })
    }

    /// Run a query to exhaustion.
    ///
    /// `ctx` is checked before every page fetch, including the first. A fetch
    /// already in flight is not interrupted.
    pub async fn query(
        &self,
        ctx: &QueryContext,
        options: &QueryOptions,
    ) -> Result<Vec<Item>, QueryError> {
        let input = self.build_request(options).inspect_err(|e| {
            warn!(table = %options.table, index = %options.index, error = %e, "query rejected");
        })?;
        if tracing::enabled!(Level::DEBUG) {
            let request = serde_json::to_string(&input).unwrap_or_default();
            debug!(%request, "query request assembled");
        }

        let mut items = Vec::new();
        let mut page = 0usize;
        let mut state = PageState::HasMore(options.start_cursor());

        while let PageState::HasMore(cursor) = state {
            if let Err(reason) = ctx.check() {
                warn!(table = %input.table_name, page, items = items.len(), %reason, "query stopped");
                return Err(QueryError::Cancelled(reason));
            }

            page += 1;
            let QueryPage {
                items: fetched,
                next_cursor,
            } = match self.backend.query_page(&input, cursor.as_ref()).await {
                Ok(p) => p,
                Err(source) => {
                    warn!(
                        table = %input.table_name,
                        page,
                        transient = source.code.is_transient(),
                        error = %source,
                        "query page failed"
                    );
                    return Err(QueryError::QueryFailed {
                        page,
                        discarded: items.len(),
                        source,
                    });
                }
            };

            let next_cursor = next_cursor.filter(|c| !c.as_str().is_empty());
            debug!(
                page,
                items = fetched.len(),
                has_more = next_cursor.is_some(),
                "query page fetched"
            );
            items.extend(fetched);
            state = match next_cursor {
                Some(next) => PageState::HasMore(Some(next)),
                None => PageState::Exhausted,
            };
        }

        info!(
            table = %input.table_name,
            index = %options.index,
            pages = page,
            items = items.len(),
            "query complete"
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use dynaquery_model::{AttributeValue, DynamoDBError};
    use parking_lot::Mutex;

    use super::*;
    use crate::error::CancelReason;
    use crate::filter::{WhereCondition, WhereOperator};

    /// Replays scripted pages and records every fetch.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        pages: Mutex<VecDeque<Result<QueryPage, DynamoDBError>>>,
        cursors: Mutex<Vec<Option<Cursor>>>,
        cancel_on_fetch: Option<QueryContext>,
    }

    impl ScriptedBackend {
        fn new(pages: impl IntoIterator<Item = Result<QueryPage, DynamoDBError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().collect()),
                ..Self::default()
            }
        }

        fn cancelling(mut self, ctx: &QueryContext) -> Self {
            self.cancel_on_fetch = Some(ctx.clone());
            self
        }

        fn calls(&self) -> usize {
            self.cursors.lock().len()
        }
    }

    #[async_trait]
    impl QueryBackend for ScriptedBackend {
        async fn query_page(
            &self,
            _input: &QueryInput,
            cursor: Option<&Cursor>,
        ) -> Result<QueryPage, DynamoDBError> {
            self.cursors.lock().push(cursor.cloned());
            if let Some(ctx) = &self.cancel_on_fetch {
                ctx.cancel();
            }
            self.pages
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(DynamoDBError::transport("script exhausted")))
        }
    }

    fn item(n: usize) -> Item {
        Item::from([("id".to_owned(), AttributeValue::from(n))])
    }

    fn page(range: std::ops::Range<usize>, next: Option<&str>) -> Result<QueryPage, DynamoDBError> {
        Ok(QueryPage::new(range.map(item).collect(), next.map(Cursor::from)))
    }

    fn three_pages() -> Vec<Result<QueryPage, DynamoDBError>> {
        vec![page(0..3, Some("p2")), page(3..6, Some("p3")), page(6..8, None)]
    }

    fn options() -> QueryOptions {
        QueryOptions::new("table", "Status", QueryKeyValue::new("Status", "active"))
    }

    fn executor(backend: &Arc<ScriptedBackend>) -> QueryExecutor {
        QueryExecutor::new(backend.clone(), QueryConfig::default())
    }

    #[tokio::test]
    async fn test_should_accumulate_all_pages_in_order() {
        let backend = Arc::new(ScriptedBackend::new(three_pages()));
        let items = executor(&backend)
            .query(&QueryContext::new(), &options())
            .await
            .unwrap();

        assert_eq!(items, (0..8).map(item).collect::<Vec<_>>());
        assert_eq!(
            *backend.cursors.lock(),
            vec![None, Some(Cursor::from("p2")), Some(Cursor::from("p3"))]
        );
    }

    #[tokio::test]
    async fn test_should_discard_items_when_a_page_fails() {
        let backend = Arc::new(ScriptedBackend::new([
            page(0..3, Some("p2")),
            Err(DynamoDBError::with_message(
                dynaquery_model::DynamoDBErrorCode::ThrottlingException,
                "slow down",
            )),
            page(6..8, None),
        ]));
        let err = executor(&backend)
            .query(&QueryContext::new(), &options())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            QueryError::QueryFailed {
                page: 2,
                discarded: 3,
                ..
            }
        ));
        assert!(err.is_execution());
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_should_stop_when_cancelled_between_pages() {
        let ctx = QueryContext::new();
        let backend = Arc::new(ScriptedBackend::new(three_pages()).cancelling(&ctx));
        let err = executor(&backend).query(&ctx, &options()).await.unwrap_err();

        assert!(matches!(
            err,
            QueryError::Cancelled(CancelReason::Cancelled)
        ));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_should_not_fetch_with_an_expired_deadline() {
        let backend = Arc::new(ScriptedBackend::new(three_pages()));
        let ctx = QueryContext::new().with_deadline(std::time::Instant::now());
        let err = executor(&backend).query(&ctx, &options()).await.unwrap_err();

        assert!(matches!(
            err,
            QueryError::Cancelled(CancelReason::DeadlineExceeded)
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_validate_before_contacting_backend() {
        let cases = [
            (
                QueryOptions {
                    table: String::new(),
                    ..options()
                },
                "table not set",
            ),
            (
                QueryOptions {
                    index: String::new(),
                    ..options()
                },
                "index not set",
            ),
            (
                QueryOptions {
                    partition: None,
                    ..options()
                },
                "partition not set",
            ),
        ];

        for (options, message) in cases {
            let backend = Arc::new(ScriptedBackend::new(three_pages()));
            let err = executor(&backend)
                .query(&QueryContext::new(), &options)
                .await
                .unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), message);
            assert_eq!(backend.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_should_check_table_before_index_and_partition() {
        let backend = Arc::new(ScriptedBackend::default());
        let err = executor(&backend)
            .query(&QueryContext::new(), &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::TableNotSet));
    }

    #[tokio::test]
    async fn test_should_wrap_filter_compile_errors() {
        let backend = Arc::new(ScriptedBackend::new(three_pages()));
        let options = options().with_filter(Where::default());
        let err = executor(&backend)
            .query(&QueryContext::new(), &options)
            .await
            .unwrap_err();

        match err {
            QueryError::BuildFilterExpressionFailed(inner) => {
                assert!(matches!(*inner, QueryError::EmptyWhereClause));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_resume_from_supplied_cursor() {
        let backend = Arc::new(ScriptedBackend::new([page(0..2, None)]));
        let options = options().with_cursor(Cursor::from("resume-here"));
        executor(&backend)
            .query(&QueryContext::new(), &options)
            .await
            .unwrap();
        assert_eq!(
            *backend.cursors.lock(),
            vec![Some(Cursor::from("resume-here"))]
        );
    }

    #[tokio::test]
    async fn test_should_treat_empty_cursor_as_start() {
        let backend = Arc::new(ScriptedBackend::new([page(0..1, None)]));
        let options = options().with_cursor(Cursor::from(""));
        executor(&backend)
            .query(&QueryContext::new(), &options)
            .await
            .unwrap();
        assert_eq!(*backend.cursors.lock(), vec![None]);
    }

    #[test]
    fn test_should_default_limit_to_one_hundred() {
        let backend = Arc::new(ScriptedBackend::default());
        let executor = executor(&backend);
        assert_eq!(executor.build_request(&options()).unwrap().limit, Some(100));
        assert_eq!(
            executor
                .build_request(&options().with_limit(-5))
                .unwrap()
                .limit,
            Some(100)
        );
        assert_eq!(
            executor
                .build_request(&options().with_limit(25))
                .unwrap()
                .limit,
            Some(25)
        );
    }

    #[test]
    fn test_should_share_placeholders_across_request_expressions() {
        let backend = Arc::new(ScriptedBackend::default());
        let options = options()
            .with_filter(Where::all([
                WhereCondition::contains("Keywords", "pika"),
                WhereCondition::compare("Status", WhereOperator::NotEqual, "archived"),
            ]))
            .with_projection(["Keywords", "info.rating"]);

        let input = executor(&backend).build_request(&options).unwrap();
        assert_eq!(input.table_name, "table");
        assert_eq!(input.index_name.as_deref(), Some("Status"));
        assert_eq!(input.key_condition_expression, "#n0 = :v0");
        assert_eq!(
            input.filter_expression.as_deref(),
            Some("(contains(#n1, :v1)) AND (#n0 <> :v2)")
        );
        assert_eq!(
            input.projection_expression.as_deref(),
            Some("#n1, #n2.#n3")
        );
        assert_eq!(input.expression_attribute_names.len(), 4);
        assert_eq!(input.expression_attribute_names["#n0"], "Status");
        assert_eq!(input.expression_attribute_names["#n3"], "rating");
        assert_eq!(
            input.expression_attribute_values[":v1"],
            AttributeValue::from("pika")
        );
    }

    #[test]
    fn test_should_omit_filter_and_projection_when_unset() {
        let backend = Arc::new(ScriptedBackend::default());
        let input = executor(&backend).build_request(&options()).unwrap();
        assert!(input.filter_expression.is_none());
        assert!(input.projection_expression.is_none());
    }

    #[test]
    fn test_should_reject_invalid_projection_path() {
        let backend = Arc::new(ScriptedBackend::default());
        let err = executor(&backend)
            .build_request(&options().with_projection(["info..rating"]))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidAttributePath(_)));
    }

    #[test]
    fn test_should_deserialize_options_document() {
        let options: QueryOptions = serde_json::from_str(
            r#"{
                "Table": "table",
                "Index": "Status",
                "Partition": {"Key": "Status", "Value": "active"},
                "Where": {"Conditions": [{"Field": "Keywords", "Operator": "CONTAINS", "Value": "pika"}]},
                "Projection": ["Keywords"]
            }"#,
        )
        .unwrap();

        assert_eq!(options.limit, 0);
        assert!(options.cursor.is_none());
        assert_eq!(
            options.partition,
            Some(QueryKeyValue::new("Status", "active"))
        );
        assert_eq!(
            options.filter,
            Some(Where::all([WhereCondition::contains("Keywords", "pika")]))
        );
    }
}
