//! Structured filters and their compilation into predicate trees.
//!
//! A [`Where`] node holds leaf [`WhereCondition`]s and nested [`Where`]
//! groups. Compilation turns every member into a [`Condition`] (conditions
//! first, then groups, each in declaration order) and folds them
//! left-to-right with the node's single [`LogicalOperator`]. Mixing AND and
//! OR at one level is done by nesting groups.

use std::fmt;
use std::str::FromStr;

use dynaquery_model::AttributeValue;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::expression::{AttributePath, CompareOp, Condition, FunctionName, LogicalOp};

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// How sibling predicates at one level combine. Absent or empty means AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogicalOperator {
    /// All members must match.
    #[default]
    And,
    /// Any member may match.
    Or,
}

impl LogicalOperator {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl From<LogicalOperator> for LogicalOp {
    fn from(op: LogicalOperator) -> Self {
        match op {
            LogicalOperator::And => Self::And,
            LogicalOperator::Or => Self::Or,
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            other => Err(QueryError::UnsupportedOperator(other.to_owned())),
        }
    }
}

impl TryFrom<String> for LogicalOperator {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogicalOperator> for String {
    fn from(op: LogicalOperator) -> Self {
        op.as_str().to_owned()
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf comparison kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WhereOperator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// `BETWEEN`, inclusive on both ends.
    Between,
    /// `IN`
    In,
    /// `CONTAINS`
    Contains,
    /// `BEGINS_WITH`
    BeginsWith,
    /// `EXISTS`
    AttributeExists,
    /// `NOT_EXISTS`
    AttributeNotExists,
}

impl WhereOperator {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::Contains => "CONTAINS",
            Self::BeginsWith => "BEGINS_WITH",
            Self::AttributeExists => "EXISTS",
            Self::AttributeNotExists => "NOT_EXISTS",
        }
    }
}

impl FromStr for WhereOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "=" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanEqual,
            "BETWEEN" => Self::Between,
            "IN" => Self::In,
            "CONTAINS" => Self::Contains,
            "BEGINS_WITH" => Self::BeginsWith,
            "EXISTS" => Self::AttributeExists,
            "NOT_EXISTS" => Self::AttributeNotExists,
            other => return Err(QueryError::UnsupportedOperator(other.to_owned())),
        };
        Ok(op)
    }
}

impl TryFrom<String> for WhereOperator {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WhereOperator> for String {
    fn from(op: WhereOperator) -> Self {
        op.as_str().to_owned()
    }
}

impl fmt::Display for WhereOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Filter tree
// ---------------------------------------------------------------------------

/// A single leaf comparison.
///
/// Operand values deserialize from plain JSON (`"pika"`, `42`, `[1, 2]`)
/// and are marshalled into [`AttributeValue`]s.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhereCondition {
    /// Attribute or document path the condition applies to.
    pub field: String,
    /// Comparison kind.
    pub operator: WhereOperator,
    /// Primary operand (lower bound for `BETWEEN`).
    #[serde(default, deserialize_with = "plain::option")]
    pub value: Option<AttributeValue>,
    /// Upper bound for `BETWEEN`.
    #[serde(default, deserialize_with = "plain::option")]
    pub value2: Option<AttributeValue>,
    /// Operands for `IN`.
    #[serde(default, deserialize_with = "plain::list")]
    pub values: Vec<AttributeValue>,
}

impl WhereCondition {
    /// A condition with no operands set.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: WhereOperator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            value2: None,
            values: Vec::new(),
        }
    }

    /// A binary comparison such as `field >= value`.
    #[must_use]
    pub fn compare(
        field: impl Into<String>,
        operator: WhereOperator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self::new(field, operator).with_value(value)
    }

    /// `field = value`.
    #[must_use]
    pub fn equal(field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::compare(field, WhereOperator::Equal, value)
    }

    /// `low <= field <= high`.
    #[must_use]
    pub fn between(
        field: impl Into<String>,
        low: impl Into<AttributeValue>,
        high: impl Into<AttributeValue>,
    ) -> Self {
        let mut cond = Self::new(field, WhereOperator::Between).with_value(low);
        cond.value2 = Some(high.into());
        cond
    }

    /// `field IN (values...)`.
    #[must_use]
    pub fn one_of<V: Into<AttributeValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let mut cond = Self::new(field, WhereOperator::In);
        cond.values = values.into_iter().map(Into::into).collect();
        cond
    }

    /// `contains(field, value)`.
    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::compare(field, WhereOperator::Contains, value)
    }

    /// `begins_with(field, value)`.
    #[must_use]
    pub fn begins_with(field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::compare(field, WhereOperator::BeginsWith, value)
    }

    /// `attribute_exists(field)`.
    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Self::new(field, WhereOperator::AttributeExists)
    }

    /// `attribute_not_exists(field)`.
    #[must_use]
    pub fn not_exists(field: impl Into<String>) -> Self {
        Self::new(field, WhereOperator::AttributeNotExists)
    }

    /// Set the primary operand.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A node of the boolean filter tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Where {
    /// Leaf conditions at this level.
    #[serde(default)]
    pub conditions: Vec<WhereCondition>,
    /// Nested groups; each compiles to a single predicate.
    #[serde(default)]
    pub groups: Vec<Where>,
    /// How this level's members combine.
    #[serde(default)]
    pub operator: LogicalOperator,
}

/// One member of a [`Where`] node, in compilation order.
#[derive(Debug, Clone, Copy)]
pub enum WhereMember<'a> {
    /// A leaf condition.
    Condition(&'a WhereCondition),
    /// A nested group.
    Group(&'a Where),
}

impl Where {
    /// Conditions that must all hold.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = WhereCondition>) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
            groups: Vec::new(),
            operator: LogicalOperator::And,
        }
    }

    /// Conditions of which at least one must hold.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = WhereCondition>) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
            groups: Vec::new(),
            operator: LogicalOperator::Or,
        }
    }

    /// Append a nested group.
    #[must_use]
    pub fn with_group(mut self, group: Where) -> Self {
        self.groups.push(group);
        self
    }

    /// Whether the node has no members at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Members in compilation order: conditions, then groups.
    pub fn members(&self) -> impl Iterator<Item = WhereMember<'_>> {
        self.conditions
            .iter()
            .map(WhereMember::Condition)
            .chain(self.groups.iter().map(WhereMember::Group))
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile a single leaf condition.
///
/// A missing operand on a binary comparison compiles as a DynamoDB `NULL`.
/// The string functions have no such fallback and fail instead.
pub fn compile_condition(condition: &WhereCondition) -> Result<Condition, QueryError> {
    let path = AttributePath::parse(&condition.field)?;
    let value = || {
        condition
            .value
            .clone()
            .unwrap_or(AttributeValue::Null(true))
    };

    let compiled = match condition.operator {
        WhereOperator::Equal => Condition::compare(path, CompareOp::Eq, value()),
        WhereOperator::NotEqual => Condition::compare(path, CompareOp::Ne, value()),
        WhereOperator::LessThan => Condition::compare(path, CompareOp::Lt, value()),
        WhereOperator::LessThanEqual => Condition::compare(path, CompareOp::Le, value()),
        WhereOperator::GreaterThan => Condition::compare(path, CompareOp::Gt, value()),
        WhereOperator::GreaterThanEqual => Condition::compare(path, CompareOp::Ge, value()),
        WhereOperator::Between => {
            let (Some(low), Some(high)) = (&condition.value, &condition.value2) else {
                return Err(QueryError::MissingRangeBound {
                    field: condition.field.clone(),
                });
            };
            Condition::Between {
                path,
                low: low.clone(),
                high: high.clone(),
            }
        }
        WhereOperator::In => {
            if condition.values.is_empty() {
                return Err(QueryError::EmptyInOperands {
                    field: condition.field.clone(),
                });
            }
            Condition::In {
                path,
                list: condition.values.clone(),
            }
        }
        WhereOperator::Contains | WhereOperator::BeginsWith => {
            let Some(operand) = &condition.value else {
                return Err(QueryError::MissingOperand {
                    field: condition.field.clone(),
                    operator: condition.operator,
                });
            };
            let name = if condition.operator == WhereOperator::Contains {
                FunctionName::Contains
            } else {
                FunctionName::BeginsWith
            };
            Condition::Function {
                name,
                path,
                arg: Some(AttributeValue::S(operand.to_text())),
            }
        }
        WhereOperator::AttributeExists => Condition::Function {
            name: FunctionName::AttributeExists,
            path,
            arg: None,
        },
        WhereOperator::AttributeNotExists => Condition::Function {
            name: FunctionName::AttributeNotExists,
            path,
            arg: None,
        },
    };
    Ok(compiled)
}

/// Compile a filter tree into a single predicate.
///
/// The first failing member aborts compilation; no partial predicate is
/// returned.
pub fn compile_where(filter: &Where) -> Result<Condition, QueryError> {
    let mut compiled = Vec::with_capacity(filter.conditions.len() + filter.groups.len());
    for member in filter.members() {
        let condition = match member {
            WhereMember::Condition(condition) => compile_condition(condition)?,
            WhereMember::Group(group) => compile_where(group)?,
        };
        compiled.push(condition);
    }

    let op = LogicalOp::from(filter.operator);
    compiled
        .into_iter()
        .reduce(|acc, next| acc.combine(op, next))
        .ok_or(QueryError::EmptyWhereClause)
}

/// Plain-JSON operand deserialization.
pub(crate) mod plain {
    use dynaquery_model::AttributeValue;
    use serde::{Deserialize, Deserializer};

    pub(crate) fn option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<AttributeValue>, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.map(AttributeValue::from))
    }

    pub(crate) fn list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<AttributeValue>, D::Error> {
        let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .map(AttributeValue::from)
            .collect())
    }
}
