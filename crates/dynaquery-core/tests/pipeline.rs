//! End-to-end: JSON options document through the executor to a scripted backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dynaquery_core::{QueryBackend, QueryConfig, QueryContext, QueryExecutor, QueryOptions};
use dynaquery_model::{AttributeValue, Cursor, DynamoDBError, Item, QueryInput, QueryPage};
use parking_lot::Mutex;

/// Serves a fixed item set in pages of `Limit`, filtering on `Status` only.
#[derive(Debug)]
struct PagedTable {
    items: Vec<Item>,
    requests: Mutex<Vec<QueryInput>>,
}

impl PagedTable {
    fn with_items(count: usize) -> Self {
        let items = (0..count)
            .map(|i| {
                let status = if i % 4 == 3 { "archived" } else { "active" };
                HashMap::from([
                    ("id".to_owned(), AttributeValue::from(i)),
                    ("Status".to_owned(), AttributeValue::from(status)),
                ])
            })
            .collect();
        Self {
            items,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryBackend for PagedTable {
    async fn query_page(
        &self,
        input: &QueryInput,
        cursor: Option<&Cursor>,
    ) -> Result<QueryPage, DynamoDBError> {
        self.requests.lock().push(input.clone());

        let start = match cursor {
            Some(c) => c
                .as_str()
                .parse::<usize>()
                .map_err(|_| DynamoDBError::validation("bad cursor"))?,
            None => 0,
        };
        let limit = usize::try_from(input.limit.unwrap_or(100)).unwrap_or(100);
        let end = (start + limit).min(self.items.len());
        let wanted = &input.expression_attribute_values[":v0"];

        let items = self.items[start..end]
            .iter()
            .filter(|item| &item["Status"] == wanted)
            .cloned()
            .collect();
        let next = (end < self.items.len()).then(|| Cursor::new(end.to_string()));
        Ok(QueryPage::new(items, next))
    }
}

fn ids(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| item["id"].to_text())
        .collect()
}

#[tokio::test]
async fn test_should_run_options_document_to_exhaustion() {
    let options: QueryOptions = serde_json::from_value(serde_json::json!({
        "Table": "table",
        "Index": "Status",
        "Limit": 3,
        "Partition": { "Key": "Status", "Value": "active" },
        "Where": {
            "Operator": "OR",
            "Conditions": [
                { "Field": "Keywords", "Operator": "CONTAINS", "Value": "pika" }
            ],
            "Groups": [
                {
                    "Conditions": [
                        { "Field": "Year", "Operator": "BETWEEN", "Value": 2000, "Value2": 2010 },
                        { "Field": "Genre", "Operator": "IN", "Values": ["anime", "film"] }
                    ]
                }
            ]
        }
    }))
    .unwrap();

    let table = Arc::new(PagedTable::with_items(8));
    let executor = QueryExecutor::new(table.clone(), QueryConfig::default());
    let items = executor.query(&QueryContext::new(), &options).await.unwrap();

    assert_eq!(ids(&items), ["0", "1", "2", "4", "5", "6"]);

    let requests = table.requests.lock();
    assert_eq!(requests.len(), 3);
    let first = &requests[0];
    assert_eq!(first.limit, Some(3));
    assert_eq!(first.key_condition_expression, "#n0 = :v0");
    assert_eq!(
        first.filter_expression.as_deref(),
        Some("(contains(#n1, :v1)) OR ((#n2 BETWEEN :v2 AND :v3) AND (#n3 IN (:v4, :v5)))")
    );
    assert_eq!(first.expression_attribute_values[":v3"], AttributeValue::from(2010));
    assert!(requests.iter().all(|r| r == first));
}

#[test]
fn test_should_reject_unknown_operator_in_document() {
    let result = serde_json::from_value::<QueryOptions>(serde_json::json!({
        "Table": "table",
        "Index": "Status",
        "Partition": { "Key": "Status", "Value": "active" },
        "Where": { "Conditions": [{ "Field": "a", "Operator": "LIKE", "Value": 1 }] }
    }));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("unsupported operator: LIKE"));
}

#[tokio::test]
async fn test_should_serve_concurrent_queries_from_one_backend() {
    let table = Arc::new(PagedTable::with_items(10));
    let executor = QueryExecutor::new(table.clone(), QueryConfig { default_limit: 4 });
    let options: QueryOptions = serde_json::from_value(serde_json::json!({
        "Table": "table",
        "Index": "Status",
        "Partition": { "Key": "Status", "Value": "archived" }
    }))
    .unwrap();

    let ctx = QueryContext::new();
    let (a, b) = tokio::join!(
        executor.query(&ctx, &options),
        executor.query(&ctx, &options)
    );
    assert_eq!(ids(&a.unwrap()), ["3", "7"]);
    assert_eq!(ids(&b.unwrap()), ["3", "7"]);
    assert_eq!(table.requests.lock().len(), 6);
}
