//! Rendering predicate trees into DynamoDB expression strings.
//!
//! Attribute names are always substituted with `#nN` placeholders and values
//! with `:vN` placeholders, so reserved words and special characters in
//! attribute names never need escaping. One builder is used per request:
//! the key condition, filter and projection share its placeholder maps.

use std::collections::HashMap;

use dynaquery_model::AttributeValue;

use super::ast::{AttributePath, Condition, FunctionName, PathElement};

const NAME_PREFIX: &str = "#n";
const VALUE_PREFIX: &str = ":v";

/// Allocates placeholders and renders expressions for a single request.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    names: HashMap<String, String>,
    placeholders_by_name: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    next_name: usize,
    next_value: usize,
}

/// Placeholder maps accumulated while rendering.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpressionAttributes {
    /// `#nN` placeholder to attribute name.
    pub names: HashMap<String, String>,
    /// `:vN` placeholder to value.
    pub values: HashMap<String, AttributeValue>,
}

impl ExpressionBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a predicate tree.
    ///
    /// Both operands of every logical node are parenthesized, so the text
    /// groups exactly as the tree does.
    pub fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Compare { path, op, value } => {
                let path = self.path(path);
                let value = self.value(value.clone());
                format!("{path} {op} {value}")
            }
            Condition::Between { path, low, high } => {
                let path = self.path(path);
                let low = self.value(low.clone());
                let high = self.value(high.clone());
                format!("{path} BETWEEN {low} AND {high}")
            }
            Condition::In { path, list } => {
                let path = self.path(path);
                let list: Vec<String> = list.iter().map(|v| self.value(v.clone())).collect();
                format!("{path} IN ({})", list.join(", "))
            }
            Condition::Function { name, path, arg } => {
                let path = self.path(path);
                match (name, arg) {
                    (FunctionName::AttributeExists | FunctionName::AttributeNotExists, _)
                    | (_, None) => format!("{name}({path})"),
                    (_, Some(arg)) => {
                        let arg = self.value(arg.clone());
                        format!("{name}({path}, {arg})")
                    }
                }
            }
            Condition::Logical { op, left, right } => {
                let left = self.condition(left);
                let right = self.condition(right);
                format!("({left}) {op} ({right})")
            }
        }
    }

    /// Render a projection list as a comma-separated path list.
    pub fn projection(&mut self, paths: &[AttributePath]) -> String {
        let rendered: Vec<String> = paths.iter().map(|p| self.path(p)).collect();
        rendered.join(", ")
    }

    /// Consume the builder, returning the accumulated placeholder maps.
    #[must_use]
    pub fn finish(self) -> ExpressionAttributes {
        ExpressionAttributes {
            names: self.names,
            values: self.values,
        }
    }

    fn path(&mut self, path: &AttributePath) -> String {
        let mut out = String::new();
        for element in &path.elements {
            match element {
                PathElement::Attribute(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(&self.name(name));
                }
                PathElement::Index(idx) => {
                    out.push('[');
                    out.push_str(&idx.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// The same attribute name always reuses its placeholder.
    fn name(&mut self, name: &str) -> String {
        if let Some(existing) = self.placeholders_by_name.get(name) {
            return existing.clone();
        }
        let placeholder = format!("{NAME_PREFIX}{}", self.next_name);
        self.next_name += 1;
        self.names.insert(placeholder.clone(), name.to_owned());
        self.placeholders_by_name
            .insert(name.to_owned(), placeholder.clone());
        placeholder
    }

    fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!("{VALUE_PREFIX}{}", self.next_value);
        self.next_value += 1;
        self.values.insert(placeholder.clone(), value);
        placeholder
    }
}
