//! Compiles a validated AST into builder clauses.

use super::ast::{ComparisonOp, Literal, Node, Operand};
use super::builder::{Boolean, Clause, Condition, Expression, Operator, QueryBuilder};
use super::error::FilterResult;
use super::functions;

/// Where the `%` wildcard goes around a pattern value.
#[derive(Debug, Clone, Copy)]
enum Wildcards {
    Both,
    Suffix,
    Prefix,
}

impl Wildcards {
    fn wrap(self, value: &str) -> String {
        match self {
            Wildcards::Both => format!("%{}%", value),
            Wildcards::Suffix => format!("{}%", value),
            Wildcards::Prefix => format!("%{}", value),
        }
    }
}

/// Compiles filter ASTs for one table.
///
/// Compilation is a pure bottom-up reduction: children are compiled first
/// and combined, and nothing reaches a builder until the whole tree has
/// compiled.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    table: &'a str,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler that qualifies columns with `table`.
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    /// Compiles a node into a single clause.
    ///
    /// A root `and`/`or` chain becomes one nested clause. Unparenthesised
    /// chains below it are flattened into the same list, while every source
    /// group becomes its own nested clause.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFunction` or `ArityMismatch` for bad function calls.
    pub fn compile(&self, node: &Node) -> FilterResult<Clause> {
        match node {
            Node::And(..) | Node::Or(..) | Node::Group(_) => self.compile_nested(node),
            _ => self.compile_predicate(node),
        }
    }

    fn compile_nested(&self, node: &Node) -> FilterResult<Clause> {
        let mut conditions = Vec::new();
        match node {
            Node::Group(inner) => self.flatten(inner, Boolean::And, &mut conditions)?,
            _ => self.flatten(node, Boolean::And, &mut conditions)?,
        }
        Ok(Clause::Nested { conditions })
    }

    /// Appends `node` to `out`, joined by `boolean`. Logical nodes are
    /// spread inline; everything else becomes one condition.
    fn flatten(&self, node: &Node, boolean: Boolean, out: &mut Vec<Condition>) -> FilterResult<()> {
        match node {
            Node::And(left, right) => {
                self.flatten(left, boolean, out)?;
                self.flatten(right, Boolean::And, out)
            }
            Node::Or(left, right) => {
                self.flatten(left, boolean, out)?;
                self.flatten(right, Boolean::Or, out)
            }
            Node::Group(_) => {
                out.push(Condition::new(boolean, self.compile_nested(node)?));
                Ok(())
            }
            _ => {
                out.push(Condition::new(boolean, self.compile_predicate(node)?));
                Ok(())
            }
        }
    }

    fn compile_predicate(&self, node: &Node) -> FilterResult<Clause> {
        match node {
            Node::Comparison { left, op, right } => self.compile_comparison(left, *op, right),
            Node::In {
                field,
                negated,
                values,
            } => Ok(Clause::In {
                column: self.column(field),
                values: values.clone(),
                negated: *negated,
            }),
            Node::Null { field, negated } => Ok(Clause::Null {
                column: self.column(field),
                negated: *negated,
            }),
            Node::And(..) | Node::Or(..) | Node::Group(_) => self.compile_nested(node),
        }
    }

    fn compile_comparison(
        &self,
        left: &Operand,
        op: ComparisonOp,
        right: &Operand,
    ) -> FilterResult<Clause> {
        let (operator, wildcards) = match op {
            ComparisonOp::Eq => (Operator::Equal, None),
            ComparisonOp::Ne => (Operator::NotEqual, None),
            ComparisonOp::Gt => (Operator::GreaterThan, None),
            ComparisonOp::Gte => (Operator::GreaterOrEqual, None),
            ComparisonOp::Lt => (Operator::LessThan, None),
            ComparisonOp::Lte => (Operator::LessOrEqual, None),
            ComparisonOp::Contains => (Operator::Like, Some(Wildcards::Both)),
            ComparisonOp::StartsWith => (Operator::Like, Some(Wildcards::Suffix)),
            ComparisonOp::EndsWith => (Operator::Like, Some(Wildcards::Prefix)),
        };

        let left = self.compile_operand(left)?;
        let right = match wildcards {
            None => self.compile_operand(right)?,
            Some(wildcards) => self.compile_pattern(right, wildcards)?,
        };

        Ok(Clause::Compare {
            left,
            operator,
            right,
        })
    }

    /// Literal patterns are wrapped before binding; anything else is
    /// wrapped with a `CONCAT` over bound `%` markers.
    fn compile_pattern(&self, operand: &Operand, wildcards: Wildcards) -> FilterResult<Expression> {
        if let Operand::Literal(literal) = operand {
            return Ok(Expression::value(Literal::String(
                wildcards.wrap(&literal.to_string()),
            )));
        }

        let inner = self.compile_operand(operand)?;
        let percent = || Expression::value("%");
        let args = match wildcards {
            Wildcards::Both => vec![percent(), inner, percent()],
            Wildcards::Suffix => vec![inner, percent()],
            Wildcards::Prefix => vec![percent(), inner],
        };
        Ok(Expression::function("CONCAT", args))
    }

    fn compile_operand(&self, operand: &Operand) -> FilterResult<Expression> {
        match operand {
            Operand::Field(name) => Ok(self.column(name)),
            Operand::Literal(literal) => Ok(Expression::Value {
                value: literal.clone(),
            }),
            Operand::Function { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.compile_operand(arg))
                    .collect::<FilterResult<Vec<_>>>()?;
                functions::resolve(name, args)
            }
        }
    }

    fn column(&self, name: &str) -> Expression {
        Expression::column(self.table, name)
    }
}

/// Compiles `node` and attaches the result to `builder`.
///
/// The builder is only touched once the whole tree has compiled.
///
/// # Errors
///
/// Returns `UnknownFunction` or `ArityMismatch` for bad function calls;
/// the builder is left unchanged.
pub fn compile<B>(node: &Node, builder: &mut B, table: &str) -> FilterResult<()>
where
    B: QueryBuilder + ?Sized,
{
    let clause = Compiler::new(table).compile(node)?;
    builder.push_where(clause);
    Ok(())
}
