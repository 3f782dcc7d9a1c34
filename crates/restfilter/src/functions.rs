//! Registry of functions callable inside filter expressions.
//!
//! The registry is a fixed static table; it cannot be extended at runtime.

use super::builder::Expression;
use super::error::{FilterResult, QuerySyntaxError};
use super::suggest::find_similar_name;

/// A built-in function.
#[derive(Debug)]
pub struct FunctionDef {
    /// Name as written in filter expressions (matched case-insensitively).
    pub name: &'static str,
    /// Minimum number of arguments.
    pub min_arity: usize,
    /// Maximum number of arguments.
    pub max_arity: usize,
    build: fn(Vec<Expression>) -> Expression,
}

impl FunctionDef {
    /// Returns true if `count` arguments are accepted.
    pub fn accepts(&self, count: usize) -> bool {
        (self.min_arity..=self.max_arity).contains(&count)
    }

    fn arity_text(&self) -> String {
        if self.min_arity == self.max_arity {
            self.min_arity.to_string()
        } else {
            format!("{} to {}", self.min_arity, self.max_arity)
        }
    }

    /// Builds the backend expression from already compiled arguments.
    ///
    /// # Errors
    ///
    /// Returns `QuerySyntaxError::ArityMismatch` if the argument count is
    /// outside the accepted range.
    pub fn compile(&self, args: Vec<Expression>) -> FilterResult<Expression> {
        if !self.accepts(args.len()) {
            return Err(QuerySyntaxError::ArityMismatch {
                name: self.name.to_string(),
                expected: self.arity_text(),
                found: args.len(),
            });
        }
        Ok((self.build)(args))
    }
}

fn concat(args: Vec<Expression>) -> Expression {
    Expression::function("CONCAT", args)
}

fn sum(args: Vec<Expression>) -> Expression {
    Expression::function("SUM", args)
}

static BUILTINS: [FunctionDef; 2] = [
    FunctionDef {
        name: "concat",
        min_arity: 2,
        max_arity: 2,
        build: concat,
    },
    FunctionDef {
        name: "sum",
        min_arity: 2,
        max_arity: 2,
        build: sum,
    },
];

/// Returns every registered function.
pub fn builtins() -> &'static [FunctionDef] {
    &BUILTINS
}

/// Looks up a function by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    BUILTINS.iter().find(|def| def.name.eq_ignore_ascii_case(name))
}

/// Resolves `name` and builds its expression over compiled arguments.
///
/// # Errors
///
/// Returns `QuerySyntaxError::UnknownFunction` for an unregistered name and
/// `QuerySyntaxError::ArityMismatch` for a wrong argument count.
pub fn resolve(name: &str, args: Vec<Expression>) -> FilterResult<Expression> {
    let def = lookup(name).ok_or_else(|| {
        QuerySyntaxError::unknown_function(
            name,
            find_similar_name(name, BUILTINS.iter().map(|def| def.name)),
        )
    })?;
    def.compile(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> Expression {
        Expression::column("foo", name)
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("CONCAT").map(|def| def.name), Some("concat"));
        assert_eq!(lookup("Sum").map(|def| def.name), Some("sum"));
        assert!(lookup("avg").is_none());
    }

    #[test]
    fn test_concat_builds_function_expression() {
        let expr = resolve("concat", vec![column("x"), Expression::value(2)]).unwrap();
        assert_eq!(
            expr,
            Expression::function("CONCAT", vec![column("x"), Expression::value(2)])
        );
    }

    #[test]
    fn test_sum_accepts_nested_expressions() {
        let inner = resolve("sum", vec![column("y"), column("z")]).unwrap();
        let expr = resolve("sum", vec![column("x"), inner.clone()]).unwrap();
        assert_eq!(expr, Expression::function("SUM", vec![column("x"), inner]));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = resolve("concat", vec![column("x")]).unwrap_err();
        assert_eq!(
            err,
            QuerySyntaxError::ArityMismatch {
                name: "concat".to_string(),
                expected: "2".to_string(),
                found: 1,
            }
        );
    }

    #[test]
    fn test_unknown_function_suggests() {
        let err = resolve("conact", vec![]).unwrap_err();
        assert_eq!(
            err,
            QuerySyntaxError::unknown_function("conact", Some("concat".to_string()))
        );

        let err = resolve("upper", vec![column("x")]).unwrap_err();
        assert_eq!(err, QuerySyntaxError::unknown_function("upper", None));
    }

    #[test]
    fn test_builtins_listed() {
        let names: Vec<_> = builtins().iter().map(|def| def.name).collect();
        assert_eq!(names, vec!["concat", "sum"]);
    }
}
