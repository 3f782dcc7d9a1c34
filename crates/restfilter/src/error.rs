//! Error types for filter parsing, validation and compilation.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, QuerySyntaxError>;

/// Broad category of a [`QuerySyntaxError`].
///
/// Every error is a client error: the filter expression is accepted or
/// rejected as a whole, and the kind tells the caller why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A lexing or grammar violation.
    Malformed,
    /// A field reference outside the allowed key set.
    UnknownKey,
    /// A call to a function missing from the registry.
    UnknownFunction,
    /// A registered function called with the wrong number of arguments.
    ArityMismatch,
    /// Parentheses or function calls nested past the configured limit.
    NestingTooDeep,
    /// More predicates than the configured limit.
    TooManyTerms,
}

impl ErrorKind {
    /// Returns a short, stable name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Malformed => "malformed",
            ErrorKind::UnknownKey => "unknown_key",
            ErrorKind::UnknownFunction => "unknown_function",
            ErrorKind::ArityMismatch => "arity_mismatch",
            ErrorKind::NestingTooDeep => "nesting_too_deep",
            ErrorKind::TooManyTerms => "too_many_terms",
        }
    }
}

/// Errors that can occur while turning a filter expression into a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuerySyntaxError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// A character that does not start any token.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A numeric literal that does not fit the literal type.
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber {
        /// The literal text as written.
        literal: String,
        /// Byte offset of the literal.
        position: usize,
    },

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Source text of the unexpected token.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// An unexpected end of input was encountered.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// An unclosed parenthesis was found.
    #[error("unclosed parenthesis opened at position {position}")]
    UnclosedParenthesis {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// An `in` / `not in` list with no values.
    #[error("empty value list at position {position}")]
    EmptyInList {
        /// Byte offset of the opening parenthesis of the list.
        position: usize,
    },

    /// Nesting exceeded the configured maximum depth.
    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The configured limit.
        limit: usize,
    },

    /// The expression holds more predicates than the configured limit.
    #[error("expression has more than {limit} predicates")]
    TooManyTerms {
        /// The configured limit.
        limit: usize,
    },

    /// A field reference that is not in the allowed key set.
    #[error("{}", unknown_message("key", .key, .suggestion.as_deref()))]
    UnknownKey {
        /// The rejected field name.
        key: String,
        /// The closest allowed key, if any is close enough.
        suggestion: Option<String>,
    },

    /// A call to a function that is not registered.
    #[error("{}", unknown_message("function", .name, .suggestion.as_deref()))]
    UnknownFunction {
        /// The function name as written.
        name: String,
        /// The closest registered function, if any is close enough.
        suggestion: Option<String>,
    },

    /// A function called with the wrong number of arguments.
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        /// The function name.
        name: String,
        /// Human-readable accepted arity, e.g. `2` or `1 to 3`.
        expected: String,
        /// Number of arguments supplied.
        found: usize,
    },
}

fn unknown_message(what: &str, name: &str, suggestion: Option<&str>) -> String {
    let base = format!("unknown {} '{}'", what, name);
    match suggestion {
        Some(s) => format!("{}. Did you mean '{}'?", base, s),
        None => base,
    }
}

impl QuerySyntaxError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuerySyntaxError::UnknownKey { .. } => ErrorKind::UnknownKey,
            QuerySyntaxError::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            QuerySyntaxError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            QuerySyntaxError::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
            QuerySyntaxError::TooManyTerms { .. } => ErrorKind::TooManyTerms,
            _ => ErrorKind::Malformed,
        }
    }

    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        QuerySyntaxError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates an unknown key error.
    pub fn unknown_key(key: impl Into<String>, suggestion: Option<String>) -> Self {
        QuerySyntaxError::UnknownKey {
            key: key.into(),
            suggestion,
        }
    }

    /// Creates an unknown function error.
    pub fn unknown_function(name: impl Into<String>, suggestion: Option<String>) -> Self {
        QuerySyntaxError::UnknownFunction {
            name: name.into(),
            suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_grammar_errors_as_malformed() {
        assert_eq!(QuerySyntaxError::EmptyExpression.kind(), ErrorKind::Malformed);
        assert_eq!(
            QuerySyntaxError::unexpected_token("and", 2).kind(),
            ErrorKind::Malformed
        );
        assert_eq!(
            QuerySyntaxError::UnterminatedString { position: 5 }.kind(),
            ErrorKind::Malformed
        );
        assert_eq!(
            QuerySyntaxError::NestingTooDeep { limit: 4 }.kind(),
            ErrorKind::NestingTooDeep
        );
        assert_eq!(
            QuerySyntaxError::TooManyTerms { limit: 8 }.kind(),
            ErrorKind::TooManyTerms
        );
    }

    #[test]
    fn test_unknown_key_message_includes_suggestion() {
        let err = QuerySyntaxError::unknown_key("nmae", Some("name".to_string()));
        assert_eq!(err.to_string(), "unknown key 'nmae'. Did you mean 'name'?");

        let err = QuerySyntaxError::unknown_key("d", None);
        assert_eq!(err.to_string(), "unknown key 'd'");
    }

    #[test]
    fn test_arity_message() {
        let err = QuerySyntaxError::ArityMismatch {
            name: "concat".to_string(),
            expected: "2".to_string(),
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "function 'concat' expects 2 argument(s), got 3"
        );
        assert_eq!(err.kind(), ErrorKind::ArityMismatch);
    }
}
