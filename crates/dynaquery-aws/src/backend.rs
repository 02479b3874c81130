//! [`QueryBackend`] over the AWS SDK DynamoDB client.

use async_trait::async_trait;
use dynaquery_core::QueryBackend;
use dynaquery_model::{Cursor, DynamoDBError, QueryInput, QueryPage};
use tracing::debug;

use crate::config::AwsConfig;
use crate::convert::{map_from_sdk, map_to_sdk};
use crate::error::from_sdk_error;

/// Sends each page as one `Query` call.
///
/// The cursor is the `LastEvaluatedKey` encoded with
/// [`Cursor::from_last_evaluated_key`]. The SDK client is cheap to clone and
/// safe to share across concurrent queries.
#[derive(Debug, Clone)]
pub struct DynamoDbBackend {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDbBackend {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }

    /// Resolve `config` and build a client from it.
    pub async fn connect(config: &AwsConfig) -> Self {
        debug!(
            region = %config.region,
            profile = ?config.profile,
            endpoint_url = ?config.endpoint_url,
            "connecting to dynamodb"
        );
        Self::new(config.connect().await)
    }
}

#[async_trait]
impl QueryBackend for DynamoDbBackend {
    async fn query_page(
        &self,
        input: &QueryInput,
        cursor: Option<&Cursor>,
    ) -> Result<QueryPage, DynamoDBError> {
        let exclusive_start_key = cursor.map(Cursor::to_exclusive_start_key).transpose()?;

        let output = self
            .client
            .query()
            .table_name(&input.table_name)
            .set_index_name(input.index_name.clone())
            .key_condition_expression(&input.key_condition_expression)
            .set_filter_expression(input.filter_expression.clone())
            .set_projection_expression(input.projection_expression.clone())
            .set_expression_attribute_names(
                (!input.expression_attribute_names.is_empty())
                    .then(|| input.expression_attribute_names.clone()),
            )
            .set_expression_attribute_values(
                (!input.expression_attribute_values.is_empty())
                    .then(|| map_to_sdk(&input.expression_attribute_values)),
            )
            .set_limit(input.limit)
            .set_exclusive_start_key(exclusive_start_key.as_ref().map(map_to_sdk))
            .send()
            .await
            .map_err(from_sdk_error)?;

        let items = output
            .items()
            .iter()
            .map(map_from_sdk)
            .collect::<Result<Vec<_>, _>>()?;
        let next_cursor = output
            .last_evaluated_key()
            .map(map_from_sdk)
            .transpose()?
            .and_then(|key| Cursor::from_last_evaluated_key(&key));

        Ok(QueryPage::new(items, next_cursor))
    }
}
