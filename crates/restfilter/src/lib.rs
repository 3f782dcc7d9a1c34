//! Parser and compiler for REST filter expressions.
//!
//! Clients of a list or search endpoint send a compact filter string such as
//! `x eq 1 and (y gt 2 or z ct 'abc')`. This crate parses it, checks every
//! field against a whitelist, and compiles it into structured clauses for a
//! query builder. It never builds or executes SQL itself.
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `eq` / `=`, `ne` / `!=` / `<>`
//! - `gt` / `>`, `gte` / `>=`, `lt` / `<`, `lte` / `<=`
//! - `ct` / `*=` (contains), `sw` / `^=` (starts with), `ew` / `$=` (ends with)
//!
//! ## Sets and Nulls
//! - `x in (1, 2)` / `x =[] (1, 2)`
//! - `x not in (1, 2)` / `x !=[] (1, 2)`
//! - `x is null`, `x is not null`
//!
//! ## Boolean Operators
//! - `and` / `&&`
//! - `or` / `||`
//! - `()` - Grouping, preserved in the output
//!
//! ## Functions
//! - `concat(a, b)`, `sum(a, b)`, nesting freely
//!
//! # Example
//!
//! ```
//! use restfilter_rs::{Clause, Expression, Filter, Operator};
//!
//! let filter = Filter::new("foo", ["x", "y"]);
//!
//! let mut clauses: Vec<Clause> = Vec::new();
//! filter.build(&mut clauses, "x eq 1").unwrap();
//!
//! assert_eq!(
//!     clauses,
//!     vec![Clause::Compare {
//!         left: Expression::column("foo", "x"),
//!         operator: Operator::Equal,
//!         right: Expression::value(1),
//!     }]
//! );
//!
//! // Fields outside the whitelist are rejected and nothing is applied
//! assert!(filter.build(&mut clauses, "d eq 1").is_err());
//! assert_eq!(clauses.len(), 1);
//! ```

mod ast;
mod builder;
mod compiler;
pub mod config;
mod error;
pub mod functions;
mod lexer;
mod parser;
mod suggest;
mod validator;

pub use ast::{ComparisonOp, Literal, Node, Operand};
pub use builder::{Boolean, Clause, Condition, Expression, Operator, QueryBuilder};
pub use compiler::{compile, Compiler};
pub use config::{Config, ConfigError};
pub use error::{ErrorKind, FilterResult, QuerySyntaxError};
pub use lexer::{Lexer, PositionedToken, Token};
pub use parser::{FilterParser, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TERMS};
pub use validator::{validate, AllowedKeys, WILDCARD};

/// A filter bound to one scope and its allowed keys.
///
/// `Filter` is immutable once built, so one instance can serve concurrent
/// requests; each `build` call only touches the builder it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    scope: String,
    allowed_keys: AllowedKeys,
    max_depth: usize,
    max_terms: usize,
}

impl Filter {
    /// Creates a filter for `scope` (the table columns are qualified with).
    ///
    /// A key list containing `"*"` accepts every field.
    pub fn new<I, S>(scope: impl Into<String>, allowed_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: scope.into(),
            allowed_keys: AllowedKeys::from_keys(allowed_keys),
            max_depth: DEFAULT_MAX_DEPTH,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }

    /// Sets the maximum nesting depth of groups and function calls.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of predicates per expression.
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms;
        self
    }

    /// Returns the scope name.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the allowed key set.
    pub fn allowed_keys(&self) -> &AllowedKeys {
        &self.allowed_keys
    }

    /// Returns the nesting limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the predicate limit.
    pub fn max_terms(&self) -> usize {
        self.max_terms
    }

    /// Parses `expression` and validates its fields.
    ///
    /// # Errors
    ///
    /// Returns a `Malformed` error for lexing or grammar problems,
    /// `NestingTooDeep` or `TooManyTerms` past the limits, and `UnknownKey`
    /// for fields outside the allowed set.
    pub fn parse(&self, expression: &str) -> FilterResult<Node> {
        let node = FilterParser::parse_with_limits(expression, self.max_depth, self.max_terms)?;
        validate(&node, &self.allowed_keys)?;
        Ok(node)
    }

    /// Parses, validates and compiles `expression` into a single clause.
    pub fn compile(&self, expression: &str) -> FilterResult<Clause> {
        let node = self.parse(expression)?;
        Compiler::new(&self.scope).compile(&node)
    }

    /// Compiles `expression` and attaches it to `builder`.
    ///
    /// The builder is modified only on success; any error leaves it
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns the first parse, validation or compilation error.
    pub fn build<B>(&self, builder: &mut B, expression: &str) -> FilterResult<()>
    where
        B: QueryBuilder + ?Sized,
    {
        match self.compile(expression) {
            Ok(clause) => {
                tracing::debug!(scope = %self.scope, "Filter expression accepted");
                tracing::trace!(scope = %self.scope, clause = ?clause, "Compiled filter clause");
                builder.push_where(clause);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(
                    scope = %self.scope,
                    kind = err.kind().as_str(),
                    error = %err,
                    "Filter expression rejected"
                );
                Err(err)
            }
        }
    }
}
