//! Structured DynamoDB expressions.
//!
//! The compilers in this crate produce [`Condition`] trees; the
//! [`ExpressionBuilder`] turns them into the expression strings and
//! placeholder maps a `Query` request carries.

pub mod ast;
pub mod builder;

pub use ast::{AttributePath, CompareOp, Condition, FunctionName, LogicalOp, PathElement};
pub use builder::{ExpressionAttributes, ExpressionBuilder};
