//! Parameterised SQL rendering for compiled filter clauses.
//!
//! [`SqlQuery`] implements [`QueryBuilder`], so a [`restfilter_rs::Filter`]
//! can build straight into it. Rendering yields SQL text with placeholders
//! and the bound values in placeholder order; literal values never appear
//! in the text.
//!
//! # Example
//!
//! ```
//! use restfilter_rs::Filter;
//! use restfilter_sql_rs::SqlQuery;
//!
//! let filter = Filter::new("foo", ["x", "y"]);
//! let mut query = SqlQuery::new("foo");
//! filter.build(&mut query, "x eq concat(y, 2)").unwrap();
//!
//! assert_eq!(
//!     query.to_sql(),
//!     "select * from `foo` where `foo`.`x` = CONCAT(`foo`.`y`,?)"
//! );
//! assert_eq!(query.bindings(), vec![serde_json::json!(2)]);
//! ```

use restfilter_rs::{Clause, Condition, Expression, QueryBuilder};
use serde::Serialize;

/// Supported database dialects for query generation.
///
/// Dialects differ in identifier quoting and placeholder style:
/// - MySQL uses backticks and `?`
/// - PostgreSQL uses double quotes and `$1`, `$2`, ...
/// - SQLite uses double quotes and `?`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// MySQL / MariaDB.
    #[default]
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }
}

/// Rendered SQL and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    /// SQL text with placeholders.
    pub sql: String,
    /// Parameter values in placeholder order.
    pub bindings: Vec<serde_json::Value>,
}

/// A `select *` query over one table that collects WHERE clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    table: String,
    dialect: Dialect,
    wheres: Vec<Clause>,
}

impl SqlQuery {
    /// Creates an empty query over `table` in the MySQL dialect.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            dialect: Dialect::default(),
            wheres: Vec::new(),
        }
    }

    /// Switches the rendering dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Returns the collected clauses.
    pub fn wheres(&self) -> &[Clause] {
        &self.wheres
    }

    /// Renders SQL text and bindings together.
    pub fn render(&self) -> Statement {
        let mut renderer = Renderer {
            dialect: self.dialect,
            bindings: Vec::new(),
        };

        let mut sql = format!("select * from {}", self.dialect.quote(&self.table));
        if !self.wheres.is_empty() {
            let clauses: Vec<String> = self
                .wheres
                .iter()
                .map(|clause| renderer.clause(clause))
                .collect();
            sql.push_str(" where ");
            sql.push_str(&clauses.join(" and "));
        }

        Statement {
            sql,
            bindings: renderer.bindings,
        }
    }

    /// Renders the SQL text.
    pub fn to_sql(&self) -> String {
        self.render().sql
    }

    /// Returns the bound values in placeholder order.
    pub fn bindings(&self) -> Vec<serde_json::Value> {
        self.render().bindings
    }
}

impl QueryBuilder for SqlQuery {
    fn push_where(&mut self, clause: Clause) {
        self.wheres.push(clause);
    }
}

/// Walks clauses in output order, so bindings line up with placeholders.
struct Renderer {
    dialect: Dialect,
    bindings: Vec<serde_json::Value>,
}

impl Renderer {
    fn bind(&mut self, value: serde_json::Value) -> String {
        self.bindings.push(value);
        self.dialect.placeholder(self.bindings.len())
    }

    fn clause(&mut self, clause: &Clause) -> String {
        match clause {
            Clause::Compare {
                left,
                operator,
                right,
            } => {
                let left = self.expression(left);
                let right = self.expression(right);
                format!("{} {} {}", left, operator.as_sql(), right)
            }
            Clause::In {
                column,
                values,
                negated,
            } => {
                let column = self.expression(column);
                let placeholders: Vec<String> =
                    values.iter().map(|value| self.bind(value.to_json())).collect();
                let keyword = if *negated { "not in" } else { "in" };
                format!("{} {} ({})", column, keyword, placeholders.join(", "))
            }
            Clause::Null { column, negated } => {
                let column = self.expression(column);
                if *negated {
                    format!("{} is not null", column)
                } else {
                    format!("{} is null", column)
                }
            }
            Clause::Nested { conditions } => format!("({})", self.conditions(conditions)),
        }
    }

    fn conditions(&mut self, conditions: &[Condition]) -> String {
        let mut sql = String::new();
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(condition.boolean.as_sql());
                sql.push(' ');
            }
            let rendered = self.clause(&condition.clause);
            sql.push_str(&rendered);
        }
        sql
    }

    fn expression(&mut self, expression: &Expression) -> String {
        match expression {
            Expression::Column { table, name } => {
                format!("{}.{}", self.dialect.quote(table), self.dialect.quote(name))
            }
            Expression::Value { value } => self.bind(value.to_json()),
            Expression::Function { name, args } => {
                let args: Vec<String> = args.iter().map(|arg| self.expression(arg)).collect();
                format!("{}({})", name, args.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restfilter_rs::{Boolean, Literal, Operator};

    fn column(name: &str) -> Expression {
        Expression::column("foo", name)
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(SqlQuery::new("foo").to_sql(), "select * from `foo`");
    }

    #[test]
    fn test_multiple_wheres_are_joined_with_and() {
        let mut query = SqlQuery::new("foo");
        query.push_where(Clause::Null {
            column: column("x"),
            negated: false,
        });
        query.push_where(Clause::Compare {
            left: column("y"),
            operator: Operator::GreaterThan,
            right: Expression::value(3),
        });

        assert_eq!(
            query.to_sql(),
            "select * from `foo` where `foo`.`x` is null and `foo`.`y` > ?"
        );
        assert_eq!(query.bindings(), vec![serde_json::json!(3)]);
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let mut query = SqlQuery::new("foo").with_dialect(Dialect::Postgres);
        query.push_where(Clause::Nested {
            conditions: vec![
                Condition::new(
                    Boolean::And,
                    Clause::In {
                        column: column("x"),
                        values: vec![Literal::Integer(1), Literal::Integer(2)],
                        negated: true,
                    },
                ),
                Condition::new(
                    Boolean::Or,
                    Clause::Compare {
                        left: column("y"),
                        operator: Operator::Like,
                        right: Expression::value("%a%"),
                    },
                ),
            ],
        });

        let statement = query.render();
        assert_eq!(
            statement.sql,
            r#"select * from "foo" where ("foo"."x" not in ($1, $2) or "foo"."y" like $3)"#
        );
        assert_eq!(
            statement.bindings,
            vec![
                serde_json::json!(1),
                serde_json::json!(2),
                serde_json::json!("%a%")
            ]
        );
    }

    #[test]
    fn test_sqlite_quotes_with_double_quotes() {
        let mut query = SqlQuery::new("foo").with_dialect(Dialect::Sqlite);
        query.push_where(Clause::Compare {
            left: column("x"),
            operator: Operator::NotEqual,
            right: Expression::value(1),
        });
        assert_eq!(
            query.to_sql(),
            r#"select * from "foo" where "foo"."x" <> ?"#
        );
    }

    #[test]
    fn test_identifier_quotes_are_escaped() {
        assert_eq!(Dialect::MySql.quote("a`b"), "`a``b`");
        assert_eq!(Dialect::Postgres.quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_statement_serializes() {
        let mut query = SqlQuery::new("foo");
        query.push_where(Clause::Compare {
            left: column("x"),
            operator: Operator::Equal,
            right: Expression::value("a"),
        });
        assert_eq!(
            serde_json::to_value(query.render()).unwrap(),
            serde_json::json!({
                "sql": "select * from `foo` where `foo`.`x` = ?",
                "bindings": ["a"]
            })
        );
    }
}
