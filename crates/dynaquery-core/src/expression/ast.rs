//! AST types for compiled DynamoDB predicates.
//!
//! A [`Condition`] is the structured form of a condition, filter, or
//! key-condition expression. Unlike the text form, operands carry their
//! typed values directly; placeholders are only allocated when the tree is
//! rendered by the [`ExpressionBuilder`](super::ExpressionBuilder).

use std::fmt;

use dynaquery_model::AttributeValue;

use crate::error::QueryError;

/// Predicate tree for condition, filter, and key-condition expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Comparison: `path op value`.
    Compare {
        /// Attribute being compared.
        path: AttributePath,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand operand.
        value: AttributeValue,
    },
    /// Range test: `path BETWEEN low AND high`, both bounds inclusive.
    Between {
        /// Attribute being tested.
        path: AttributePath,
        /// Lower bound.
        low: AttributeValue,
        /// Upper bound.
        high: AttributeValue,
    },
    /// Set membership: `path IN (list...)`. The list is never empty.
    In {
        /// Attribute being tested.
        path: AttributePath,
        /// Candidate values.
        list: Vec<AttributeValue>,
    },
    /// Function call on a path, e.g. `begins_with(path, :v)`.
    Function {
        /// Function name.
        name: FunctionName,
        /// Attribute the function applies to.
        path: AttributePath,
        /// Second argument, present for `begins_with` and `contains`.
        arg: Option<AttributeValue>,
    },
    /// Logical combination: `left AND right` or `left OR right`.
    Logical {
        /// Logical operator.
        op: LogicalOp,
        /// Left-hand expression.
        left: Box<Condition>,
        /// Right-hand expression.
        right: Box<Condition>,
    },
}

impl Condition {
    /// `path op value`.
    #[must_use]
    pub fn compare(path: AttributePath, op: CompareOp, value: AttributeValue) -> Self {
        Self::Compare { path, op, value }
    }

    /// `path = value`.
    #[must_use]
    pub fn equal(path: AttributePath, value: AttributeValue) -> Self {
        Self::compare(path, CompareOp::Eq, value)
    }

    /// Combine two predicates with `op`, `self` on the left.
    #[must_use]
    pub fn combine(self, op: LogicalOp, right: Condition) -> Self {
        Self::Logical {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    /// `self AND right`.
    #[must_use]
    pub fn and(self, right: Condition) -> Self {
        self.combine(LogicalOp::And, right)
    }

    /// `self OR right`.
    #[must_use]
    pub fn or(self, right: Condition) -> Self {
        self.combine(LogicalOp::Or, right)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Built-in DynamoDB expression functions used by filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionName {
    /// `attribute_exists(path)` - true if the attribute exists.
    AttributeExists,
    /// `attribute_not_exists(path)` - true if the attribute does not exist.
    AttributeNotExists,
    /// `begins_with(path, substr)` - true if the string begins with the prefix.
    BeginsWith,
    /// `contains(path, operand)` - true if string contains substring or set contains element.
    Contains,
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeExists => write!(f, "attribute_exists"),
            Self::AttributeNotExists => write!(f, "attribute_not_exists"),
            Self::BeginsWith => write!(f, "begins_with"),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// A document path consisting of one or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    /// The path elements in order.
    pub elements: Vec<PathElement>,
}

/// A single element in an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// A named attribute.
    Attribute(String),
    /// A list index dereference (e.g., `[0]`).
    Index(usize),
}

impl AttributePath {
    /// A path naming a single top-level attribute, taken verbatim.
    ///
    /// Dots and brackets are part of the name; use [`AttributePath::parse`]
    /// for document paths.
    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            elements: vec![PathElement::Attribute(name.into())],
        }
    }

    /// Parse a document path such as `info.rating` or `tags[0].name`.
    ///
    /// Each dot-separated segment is an attribute name optionally followed by
    /// one or more `[n]` list indexes.
    pub fn parse(path: &str) -> Result<Self, QueryError> {
        let invalid = || QueryError::InvalidAttributePath(path.to_owned());

        let mut elements = Vec::new();
        for segment in path.split('.') {
            let (name, mut rest) = match segment.find('[') {
                Some(pos) => segment.split_at(pos),
                None => (segment, ""),
            };
            if name.is_empty() {
                return Err(invalid());
            }
            elements.push(PathElement::Attribute(name.to_owned()));

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(invalid)?;
                let index = rest[1..close].parse::<usize>().map_err(|_| invalid())?;
                elements.push(PathElement::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid());
                }
            }
        }
        Ok(Self { elements })
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, elem) in self.elements.iter().enumerate() {
            match elem {
                PathElement::Attribute(name) => {
                    if i > 0 {
                        write!(f, ".{name}")?;
                    } else {
                        write!(f, "{name}")?;
                    }
                }
                PathElement::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
