//! Compiled clauses and the query-builder capability that receives them.
//!
//! The compiler never produces SQL text. It produces a [`Clause`] tree whose
//! leaves are qualified columns, bound values and function expressions, and
//! hands it to a [`QueryBuilder`]. Literal values stay separate from the
//! structure, so a builder can bind them as parameters.

use serde::Serialize;

use super::ast::Literal;

/// A scalar expression inside a compiled clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    /// A column qualified by its table, e.g. `foo.x`.
    Column {
        /// Owning table.
        table: String,
        /// Column name.
        name: String,
    },
    /// A bound parameter.
    Value {
        /// The value to bind.
        value: Literal,
    },
    /// A backend function applied to sub-expressions, e.g. `CONCAT(a, b)`.
    Function {
        /// Backend function name.
        name: &'static str,
        /// Arguments in order.
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Creates a qualified column reference.
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::Column {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Creates a bound value.
    pub fn value(value: impl Into<Literal>) -> Self {
        Expression::Value {
            value: value.into(),
        }
    }

    /// Creates a function expression.
    pub fn function(name: &'static str, args: Vec<Expression>) -> Self {
        Expression::Function { name, args }
    }
}

/// Binary comparison operators of compiled clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessOrEqual,
    /// Pattern match; `%` in the bound value is the wildcard.
    Like,
}

impl Operator {
    /// Returns the SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::Like => "like",
        }
    }
}

/// How a condition joins the one before it in a nested list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Boolean {
    /// Both conditions must hold.
    And,
    /// Either condition may hold.
    Or,
}

impl Boolean {
    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

/// A compiled predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Clause {
    /// `left operator right`.
    Compare {
        /// Left-hand expression.
        left: Expression,
        /// The comparison.
        operator: Operator,
        /// Right-hand expression.
        right: Expression,
    },
    /// Set membership, `column [not] in (values)`.
    In {
        /// The tested column.
        column: Expression,
        /// Values to bind, in source order.
        values: Vec<Literal>,
        /// True for `not in`.
        negated: bool,
    },
    /// `column is [not] null`.
    Null {
        /// The tested column.
        column: Expression,
        /// True for `is not null`.
        negated: bool,
    },
    /// A delimited sub-clause. The first condition's boolean is ignored.
    Nested {
        /// Conditions in source order.
        conditions: Vec<Condition>,
    },
}

/// One entry of a [`Clause::Nested`] list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    /// Connector to the previous condition.
    pub boolean: Boolean,
    /// The condition itself.
    pub clause: Clause,
}

impl Condition {
    /// Creates a condition joined with `boolean`.
    pub fn new(boolean: Boolean, clause: Clause) -> Self {
        Self { boolean, clause }
    }
}

/// The capability a query backend offers to the compiler.
///
/// The compiler calls [`push_where`](QueryBuilder::push_where) at most once
/// per successful build, after the whole expression has been validated and
/// compiled. Builders that receive several clauses join them with AND.
pub trait QueryBuilder {
    /// Attaches a compiled clause to the builder's WHERE conditions.
    fn push_where(&mut self, clause: Clause);
}

/// Collects clauses as-is. Useful for inspecting compiler output.
impl QueryBuilder for Vec<Clause> {
    fn push_where(&mut self, clause: Clause) {
        self.push(clause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_serializes_to_tagged_json() {
        let clause = Clause::Compare {
            left: Expression::column("foo", "x"),
            operator: Operator::Equal,
            right: Expression::value(1),
        };

        assert_eq!(
            serde_json::to_value(&clause).unwrap(),
            serde_json::json!({
                "type": "compare",
                "left": {"type": "column", "table": "foo", "name": "x"},
                "operator": "equal",
                "right": {"type": "value", "value": 1}
            })
        );
    }

    #[test]
    fn test_nested_clause_json() {
        let clause = Clause::Nested {
            conditions: vec![Condition::new(
                Boolean::And,
                Clause::Null {
                    column: Expression::column("foo", "x"),
                    negated: true,
                },
            )],
        };

        assert_eq!(
            serde_json::to_value(&clause).unwrap(),
            serde_json::json!({
                "type": "nested",
                "conditions": [{
                    "boolean": "and",
                    "clause": {
                        "type": "null",
                        "column": {"type": "column", "table": "foo", "name": "x"},
                        "negated": true
                    }
                }]
            })
        );
    }

    #[test]
    fn test_vec_builder_collects() {
        let mut clauses: Vec<Clause> = Vec::new();
        clauses.push_where(Clause::Null {
            column: Expression::column("foo", "x"),
            negated: false,
        });
        assert_eq!(clauses.len(), 1);
    }

    #[test]
    fn test_operator_sql() {
        assert_eq!(Operator::GreaterOrEqual.as_sql(), ">=");
        assert_eq!(Operator::Like.as_sql(), "like");
        assert_eq!(Boolean::Or.as_sql(), "or");
    }
}
