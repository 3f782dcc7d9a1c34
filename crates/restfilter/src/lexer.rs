//! Lexer (tokenizer) for filter expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::ComparisonOp;
use super::error::{FilterResult, QuerySyntaxError};

/// A token with its source text and position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    /// The token.
    pub token: Token,
    /// The source text the token was read from.
    pub text: String,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ==================== Values ====================
    /// A field or function name.
    Identifier(String),

    /// An integer literal.
    Integer(i64),

    /// A decimal literal.
    Float(f64),

    /// A quoted string literal, escapes resolved.
    String(String),

    // ==================== Operators ====================
    /// Any comparison operator, word or symbolic form.
    Comparison(ComparisonOp),

    /// The `in` keyword or `=[]`.
    In,

    /// The `!=[]` operator.
    NotIn,

    /// The `not` keyword.
    Not,

    /// The `is` keyword.
    Is,

    /// The `null` keyword.
    Null,

    /// The AND operator (`and`, `&&`).
    And,

    /// The OR operator (`or`, `||`).
    Or,

    // ==================== Punctuation ====================
    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,

    /// Argument or value separator `,`.
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => f.write_str(name),
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Comparison(op) => f.write_str(op.as_str()),
            Token::In => f.write_str("in"),
            Token::NotIn => f.write_str("!=[]"),
            Token::Not => f.write_str("not"),
            Token::Is => f.write_str("is"),
            Token::Null => f.write_str("null"),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

/// Lexer for tokenizing filter expressions.
///
/// Tokenization is total and deterministic: the same input always yields
/// the same token sequence, or the same error.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `offset` characters past the next one.
    fn peek_nth(&self, offset: usize) -> Option<char> {
        self.chars.clone().nth(offset).map(|(_, c)| c)
    }

    /// Consumes and returns the next character.
    fn next_char(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    /// Returns the byte offset of the next character.
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Consumes `n` characters.
    fn bump(&mut self, n: usize) {
        for _ in 0..n {
            self.next_char();
        }
    }

    /// Reads an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        ident
    }

    /// Reads a quoted string (single or double quotes).
    fn read_quoted_string(&mut self, quote_char: char, start: usize) -> FilterResult<String> {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            match c {
                c if c == quote_char => return Ok(result),
                '\\' => match self.next_char() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some(escaped) => result.push(escaped),
                    None => break,
                },
                c => result.push(c),
            }
        }
        Err(QuerySyntaxError::UnterminatedString { position: start })
    }

    /// Reads an integer or decimal literal, with an optional leading `-`.
    fn read_number(&mut self, start: usize) -> FilterResult<Token> {
        let mut number = String::new();
        if self.peek() == Some('-') {
            number.push('-');
            self.next_char();
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                number.push(c);
                self.next_char();
            } else if c == '.' && !is_float && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) {
                is_float = true;
                number.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        let invalid = || QuerySyntaxError::InvalidNumber {
            literal: number.clone(),
            position: start,
        };
        if is_float {
            number.parse::<f64>().map(Token::Float).map_err(|_| invalid())
        } else {
            number.parse::<i64>().map(Token::Integer).map_err(|_| invalid())
        }
    }

    /// Maps a word to its keyword token, or an identifier.
    fn keyword(ident: String) -> Token {
        match ident.to_lowercase().as_str() {
            "eq" => Token::Comparison(ComparisonOp::Eq),
            "ne" => Token::Comparison(ComparisonOp::Ne),
            "gt" => Token::Comparison(ComparisonOp::Gt),
            "gte" => Token::Comparison(ComparisonOp::Gte),
            "lt" => Token::Comparison(ComparisonOp::Lt),
            "lte" => Token::Comparison(ComparisonOp::Lte),
            "ct" => Token::Comparison(ComparisonOp::Contains),
            "sw" => Token::Comparison(ComparisonOp::StartsWith),
            "ew" => Token::Comparison(ComparisonOp::EndsWith),
            "in" => Token::In,
            "not" => Token::Not,
            "and" => Token::And,
            "or" => Token::Or,
            "is" => Token::Is,
            "null" => Token::Null,
            _ => Token::Identifier(ident),
        }
    }

    /// Reads a symbolic operator or punctuation. `None` means `c` starts
    /// no symbol.
    fn read_symbol(&mut self, c: char) -> Option<Token> {
        let next = self.peek_nth(1);
        let (token, width) = match (c, next) {
            ('(', _) => (Token::OpenParen, 1),
            (')', _) => (Token::CloseParen, 1),
            (',', _) => (Token::Comma, 1),
            ('=', Some('[')) if self.peek_nth(2) == Some(']') => (Token::In, 3),
            ('=', _) => (Token::Comparison(ComparisonOp::Eq), 1),
            ('!', Some('=')) if self.peek_nth(2) == Some('[') && self.peek_nth(3) == Some(']') => {
                (Token::NotIn, 4)
            }
            ('!', Some('=')) => (Token::Comparison(ComparisonOp::Ne), 2),
            ('<', Some('>')) => (Token::Comparison(ComparisonOp::Ne), 2),
            ('<', Some('=')) => (Token::Comparison(ComparisonOp::Lte), 2),
            ('<', _) => (Token::Comparison(ComparisonOp::Lt), 1),
            ('>', Some('=')) => (Token::Comparison(ComparisonOp::Gte), 2),
            ('>', _) => (Token::Comparison(ComparisonOp::Gt), 1),
            ('*', Some('=')) => (Token::Comparison(ComparisonOp::Contains), 2),
            ('^', Some('=')) => (Token::Comparison(ComparisonOp::StartsWith), 2),
            ('$', Some('=')) => (Token::Comparison(ComparisonOp::EndsWith), 2),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            _ => return None,
        };
        self.bump(width);
        Some(token)
    }

    /// Returns the next token with its position, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error for an unrecognized character, an unterminated
    /// string literal, or a number that does not fit its type.
    pub fn next_token(&mut self) -> FilterResult<Option<PositionedToken>> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let start = self.offset();

        let token = match c {
            '"' | '\'' => Token::String(self.read_quoted_string(c, start)?),
            '-' if self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) => self.read_number(start)?,
            _ if c.is_ascii_digit() => self.read_number(start)?,
            _ if c.is_ascii_alphabetic() || c == '_' => Self::keyword(self.read_identifier()),
            _ => self
                .read_symbol(c)
                .ok_or(QuerySyntaxError::UnexpectedCharacter {
                    character: c,
                    position: start,
                })?,
        };

        let end = self.offset();
        Ok(Some(PositionedToken {
            token,
            text: self.input[start..end].to_string(),
            position: start,
        }))
    }

    /// Collects all tokens, stopping at the first error.
    pub fn tokenize(mut self) -> FilterResult<Vec<PositionedToken>> {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token()? {
            tokens.push(positioned_token);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }

    #[test]
    fn test_tokenize_simple_comparison() {
        assert_eq!(
            kinds("x eq 1"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Comparison(ComparisonOp::Eq),
                Token::Integer(1),
            ]
        );
    }

    #[test]
    fn test_word_and_symbol_operators_match() {
        let pairs = [
            ("eq", "="),
            ("ne", "!="),
            ("ne", "<>"),
            ("gt", ">"),
            ("gte", ">="),
            ("lt", "<"),
            ("lte", "<="),
            ("ct", "*="),
            ("sw", "^="),
            ("ew", "$="),
            ("in", "=[]"),
            ("and", "&&"),
            ("or", "||"),
        ];
        for (word, symbol) in pairs {
            assert_eq!(kinds(word), kinds(symbol), "{} vs {}", word, symbol);
        }
    }

    #[test]
    fn test_not_in_symbol() {
        assert_eq!(
            kinds("x !=[] (1)"),
            vec![
                Token::Identifier("x".to_string()),
                Token::NotIn,
                Token::OpenParen,
                Token::Integer(1),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("X IS NOT NULL"),
            vec![
                Token::Identifier("X".to_string()),
                Token::Is,
                Token::Not,
                Token::Null,
            ]
        );
    }

    #[test]
    fn test_symbols_without_spaces() {
        assert_eq!(
            kinds("x>=1&&y<2"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Comparison(ComparisonOp::Gte),
                Token::Integer(1),
                Token::And,
                Token::Identifier("y".to_string()),
                Token::Comparison(ComparisonOp::Lt),
                Token::Integer(2),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![Token::Integer(42)]);
        assert_eq!(kinds("-7"), vec![Token::Integer(-7)]);
        assert_eq!(kinds("1.5"), vec![Token::Float(1.5)]);
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(kinds("'abc'"), vec![Token::String("abc".to_string())]);
        assert_eq!(kinds("\"a b\""), vec![Token::String("a b".to_string())]);
        assert_eq!(
            kinds(r#"'it\'s'"#),
            vec![Token::String("it's".to_string())]
        );
    }

    #[test]
    fn test_identifiers_with_digits_and_underscores() {
        assert_eq!(
            kinds("created_at2 _x"),
            vec![
                Token::Identifier("created_at2".to_string()),
                Token::Identifier("_x".to_string()),
            ]
        );
    }

    #[test]
    fn test_function_call_tokens() {
        assert_eq!(
            kinds("concat(x,2)"),
            vec![
                Token::Identifier("concat".to_string()),
                Token::OpenParen,
                Token::Identifier("x".to_string()),
                Token::Comma,
                Token::Integer(2),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_positions_and_text() {
        let tokens = Lexer::new("x  >= 10").tokenize().unwrap();
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 3);
        assert_eq!(tokens[1].text, ">=");
        assert_eq!(tokens[2].position, 6);
        assert_eq!(tokens[2].text, "10");
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("x # 1").tokenize().unwrap_err();
        assert_eq!(
            err,
            QuerySyntaxError::UnexpectedCharacter {
                character: '#',
                position: 2,
            }
        );

        // Single '&' and '|' are not operators
        assert!(Lexer::new("x = 1 & y = 2").tokenize().is_err());
        assert!(Lexer::new("x = 1 | y = 2").tokenize().is_err());
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("x eq 'abc").tokenize().unwrap_err();
        assert_eq!(err, QuerySyntaxError::UnterminatedString { position: 5 });
    }

    #[test]
    fn test_integer_overflow() {
        let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
        assert!(matches!(err, QuerySyntaxError::InvalidNumber { .. }));
    }

    #[test]
    fn test_deterministic() {
        let input = "x = 1 and (y ct 'a' || z in (1, 2))";
        assert_eq!(
            Lexer::new(input).tokenize().unwrap(),
            Lexer::new(input).tokenize().unwrap()
        );
    }
}
