//! Abstract Syntax Tree (AST) for filter expressions.

use std::fmt;

use serde::Serialize;

/// Comparison operators, resolved once by the lexer.
///
/// Word forms and symbolic aliases map to the same variant, so `x gt 1` and
/// `x > 1` produce identical trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `eq`, `=`
    Eq,
    /// `ne`, `!=`, `<>`
    Ne,
    /// `gt`, `>`
    Gt,
    /// `gte`, `>=`
    Gte,
    /// `lt`, `<`
    Lt,
    /// `lte`, `<=`
    Lte,
    /// `ct`, `*=` (contains)
    Contains,
    /// `sw`, `^=` (starts with)
    StartsWith,
    /// `ew`, `$=` (ends with)
    EndsWith,
}

impl ComparisonOp {
    /// Returns the canonical word form of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Gte => "gte",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Lte => "lte",
            ComparisonOp::Contains => "ct",
            ComparisonOp::StartsWith => "sw",
            ComparisonOp::EndsWith => "ew",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed constant. The type is fixed by the lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    /// Integer literal, e.g. `42` or `-7`.
    Integer(i64),
    /// Decimal literal, e.g. `1.5`.
    Float(f64),
    /// Quoted string literal.
    String(String),
}

impl Literal {
    /// Converts the literal to a JSON value for parameter binding.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::Integer(n) => serde_json::Value::from(*n),
            Literal::Float(n) => serde_json::Value::from(*n),
            Literal::String(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            // Floats always come from text with a decimal point
            Literal::Float(n) if n.fract() == 0.0 => write!(f, "{:.1}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

/// A value position: either side of a comparison or a function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A bare identifier naming a column.
    Field(String),
    /// A constant.
    Literal(Literal),
    /// A call such as `concat(x, 1)`. Arguments nest to any depth.
    Function {
        /// The function name as written.
        name: String,
        /// Arguments in source order.
        args: Vec<Operand>,
    },
}

impl Operand {
    /// Creates a field reference.
    pub fn field(name: impl Into<String>) -> Self {
        Operand::Field(name.into())
    }

    /// Creates a literal operand.
    pub fn literal(value: impl Into<Literal>) -> Self {
        Operand::Literal(value.into())
    }

    /// Creates a function call operand.
    pub fn call(name: impl Into<String>, args: Vec<Operand>) -> Self {
        Operand::Function {
            name: name.into(),
            args,
        }
    }
}

/// Represents a parsed filter expression.
///
/// Each variant is either a predicate or a boolean combination of
/// predicates. `Group` only appears where the source had parentheses.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `left op right`, e.g. `x eq 1` or `x eq concat(y, 1)`.
    Comparison {
        /// Left operand.
        left: Operand,
        /// The operator.
        op: ComparisonOp,
        /// Right operand.
        right: Operand,
    },

    /// `field in (...)` or `field not in (...)`.
    In {
        /// The tested field.
        field: String,
        /// True for `not in` / `!=[]`.
        negated: bool,
        /// Values in source order.
        values: Vec<Literal>,
    },

    /// `field is null` or `field is not null`.
    Null {
        /// The tested field.
        field: String,
        /// True for `is not null`.
        negated: bool,
    },

    /// Logical AND of two expressions.
    And(Box<Node>, Box<Node>),

    /// Logical OR of two expressions.
    Or(Box<Node>, Box<Node>),

    /// An explicitly parenthesised sub-expression.
    Group(Box<Node>),
}

impl Node {
    /// Creates a comparison node.
    pub fn compare(left: Operand, op: ComparisonOp, right: Operand) -> Self {
        Node::Comparison { left, op, right }
    }

    /// Creates an AND node from two expressions.
    ///
    /// # Example
    ///
    /// ```
    /// use restfilter_rs::{ComparisonOp, Node, Operand};
    ///
    /// let left = Node::compare(Operand::field("x"), ComparisonOp::Eq, Operand::literal(1));
    /// let right = Node::compare(Operand::field("y"), ComparisonOp::Gt, Operand::literal(2));
    /// assert!(matches!(Node::and(left, right), Node::And(_, _)));
    /// ```
    pub fn and(left: Node, right: Node) -> Self {
        Node::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR node from two expressions.
    pub fn or(left: Node, right: Node) -> Self {
        Node::Or(Box::new(left), Box::new(right))
    }

    /// Wraps an expression in an explicit group.
    pub fn group(inner: Node) -> Self {
        Node::Group(Box::new(inner))
    }

    /// Returns every field referenced by the expression, in source order.
    ///
    /// Includes fields inside function arguments and the subjects of
    /// `in` and `is null` checks. Duplicates are kept.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Comparison { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Node::In { field, .. } | Node::Null { field, .. } => out.push(field),
            Node::And(left, right) | Node::Or(left, right) => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Node::Group(inner) => inner.collect_fields(out),
        }
    }
}

impl Operand {
    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Operand::Field(name) => out.push(name),
            Operand::Literal(_) => {}
            Operand::Function { args, .. } => {
                for arg in args {
                    arg.collect_fields(out);
                }
            }
        }
    }
}
