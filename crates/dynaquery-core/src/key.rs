//! Key condition construction for index queries.
//!
//! A query must pin the partition key with equality and may narrow by sort
//! key. The partition operator defaults to equality when omitted. The sort
//! key must name its operator explicitly, and only `=` is supported today;
//! range and prefix operators on the sort key are rejected rather than
//! silently ignored.

use dynaquery_model::AttributeValue;
use serde::{Deserialize, Deserializer};

use crate::error::QueryError;
use crate::expression::{AttributePath, Condition};
use crate::filter::WhereOperator;

/// A key attribute and the value it is matched against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryKeyValue {
    /// Key attribute name.
    #[serde(default)]
    pub key: String,
    /// Value to match.
    #[serde(default, deserialize_with = "crate::filter::plain::option")]
    pub value: Option<AttributeValue>,
    /// Match operator. Absent and `""` are the same: unset.
    #[serde(default, deserialize_with = "optional_operator")]
    pub operator: Option<WhereOperator>,
}

impl QueryKeyValue {
    /// `key = value`.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            operator: None,
        }
    }

    /// `key = value` with the operator spelled out, as a sort key requires.
    #[must_use]
    pub fn equal(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::new(key, value).with_operator(WhereOperator::Equal)
    }

    /// Override the match operator.
    #[must_use]
    pub fn with_operator(mut self, operator: WhereOperator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Key and value, when both are set.
    fn parts(&self) -> Option<(&str, &AttributeValue)> {
        match &self.value {
            Some(value) if !self.key.is_empty() => Some((&self.key, value)),
            _ => None,
        }
    }
}

/// A key condition: partition equality, optionally AND a sort-key predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition(Condition);

impl KeyCondition {
    /// The underlying predicate tree.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.0
    }
}

/// Build the key condition for a query.
///
/// A sort key whose key or value is unset is ignored. A sort key without an
/// operator fails like any other unsupported operator.
pub fn build_key_condition(
    partition: Option<&QueryKeyValue>,
    sort: Option<&QueryKeyValue>,
) -> Result<KeyCondition, QueryError> {
    let partition = partition.ok_or(QueryError::PartitionNotSet)?;
    let (key, value) = partition.parts().ok_or(QueryError::PartitionNotSet)?;
    let operator = partition.operator.unwrap_or(WhereOperator::Equal);
    if operator != WhereOperator::Equal {
        return Err(QueryError::UnsupportedPartitionOperator(operator));
    }
    let mut condition = key_equality(key, value);

    if let Some(sort) = sort {
        if let Some((key, value)) = sort.parts() {
            let sort_condition = match sort.operator {
                Some(WhereOperator::Equal) => key_equality(key, value),
                other => {
                    let spelling = other.map_or("", |op| op.as_str());
                    return Err(QueryError::UnsupportedSortOperator(spelling.to_owned()));
                }
            };
            condition = condition.and(sort_condition);
        }
    }

    Ok(KeyCondition(condition))
}

fn optional_operator<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<WhereOperator>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(spelling) if !spelling.is_empty() => spelling
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Key attributes are always top-level, so the name is taken verbatim.
fn key_equality(key: &str, value: &AttributeValue) -> Condition {
    Condition::equal(AttributePath::attribute(key), value.clone())
}
