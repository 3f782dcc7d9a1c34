//! Recursive descent parser for filter expressions.

use super::ast::{Literal, Node, Operand};
use super::error::{FilterResult, QuerySyntaxError};
use super::lexer::{Lexer, PositionedToken, Token};

/// Default limit for nested groups and function calls.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default limit for predicates in one expression.
pub const DEFAULT_MAX_TERMS: usize = 256;

/// Parser for filter expressions.
///
/// A precedence-climbing recursive descent parser. Explicit parentheses are
/// kept in the tree as [`Node::Group`], so the compiled output nests exactly
/// as the source did.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr ("or" and_expr)*
/// and_expr   ::= term ("and" term)*
/// term       ::= "(" expression ")"
///              | field "is" ["not"] "null"
///              | field ["not"] "in" "(" literal ("," literal)* ")"
///              | field "!=[]" "(" literal ("," literal)* ")"
///              | value comparison value
/// value      ::= field | literal | call
/// call       ::= identifier "(" (value ("," value)*)? ")"
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. comparisons, `in`, `is null`
/// 2. `and` / `&&` - binary, left-associative
/// 3. `or` / `||` - binary, left-associative
///
/// # Example
///
/// ```
/// use restfilter_rs::{FilterParser, Node};
///
/// let node = FilterParser::parse("x eq 1 or y gt 2").unwrap();
/// assert!(matches!(node, Node::Or(_, _)));
///
/// let node = FilterParser::parse("(x eq 1)").unwrap();
/// assert!(matches!(node, Node::Group(_)));
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
    depth: usize,
    max_depth: usize,
    terms: usize,
    max_terms: usize,
}

impl FilterParser {
    /// Creates a parser over an already tokenized expression.
    pub fn new(tokens: Vec<PositionedToken>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            terms: 0,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }

    /// Sets the maximum nesting depth of groups and function calls.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of predicates in the whole expression.
    ///
    /// Every `and`/`or` operand adds a level to the tree, so this bounds the
    /// tree height together with the nesting limit.
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms;
        self
    }

    /// Parses a filter expression string into a [`Node`].
    ///
    /// # Errors
    ///
    /// Returns `QuerySyntaxError::EmptyExpression` if the input is blank,
    /// a lexer error for bad characters or literals, and a grammar error
    /// (`UnexpectedToken`, `UnexpectedEndOfInput`, `UnclosedParenthesis`)
    /// for anything structurally invalid.
    pub fn parse(input: &str) -> FilterResult<Node> {
        Self::parse_with_depth(input, DEFAULT_MAX_DEPTH)
    }

    /// Like [`FilterParser::parse`], with a custom nesting limit.
    pub fn parse_with_depth(input: &str, max_depth: usize) -> FilterResult<Node> {
        Self::parse_with_limits(input, max_depth, DEFAULT_MAX_TERMS)
    }

    /// Like [`FilterParser::parse`], with custom nesting and predicate limits.
    ///
    /// # Errors
    ///
    /// Fails with `NestingTooDeep` or `TooManyTerms` once a limit is passed.
    pub fn parse_with_limits(input: &str, max_depth: usize, max_terms: usize) -> FilterResult<Node> {
        let tokens = Lexer::new(input).tokenize()?;
        tracing::trace!(tokens = tokens.len(), "Tokenized filter expression");
        Self::new(tokens)
            .with_max_depth(max_depth)
            .with_max_terms(max_terms)
            .parse_tokens()
    }

    /// Parses the whole token stream into a single expression.
    pub fn parse_tokens(mut self) -> FilterResult<Node> {
        if self.tokens.is_empty() {
            return Err(QuerySyntaxError::EmptyExpression);
        }

        let node = self.parse_expression()?;

        // Check that we consumed all tokens
        if let Some(remaining) = self.peek_positioned() {
            return Err(QuerySyntaxError::unexpected_token(
                remaining.text.clone(),
                remaining.position,
            ));
        }

        Ok(node)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|pt| &pt.token)
    }

    fn peek_positioned(&self) -> Option<&PositionedToken> {
        self.tokens.get(self.position)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<&PositionedToken> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token matches the expected token.
    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    /// Builds the error for whatever sits at the current position.
    fn unexpected(&self) -> QuerySyntaxError {
        match self.peek_positioned() {
            Some(pt) => QuerySyntaxError::unexpected_token(pt.text.clone(), pt.position),
            None => QuerySyntaxError::UnexpectedEndOfInput,
        }
    }

    /// Consumes the expected token or fails on the current one.
    fn expect(&mut self, expected: &Token) -> FilterResult<usize> {
        match self.peek_positioned() {
            Some(pt) if &pt.token == expected => {
                let position = pt.position;
                self.position += 1;
                Ok(position)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&mut self) -> FilterResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(QuerySyntaxError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn count_term(&mut self) -> FilterResult<()> {
        self.terms += 1;
        if self.terms > self.max_terms {
            return Err(QuerySyntaxError::TooManyTerms {
                limit: self.max_terms,
            });
        }
        Ok(())
    }

    /// Parses the top-level expression (OR expression).
    fn parse_expression(&mut self) -> FilterResult<Node> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("or" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Node> {
        let mut left = self.parse_and_expr()?;

        while self.check(&Token::Or) {
            self.advance(); // consume 'or'
            let right = self.parse_and_expr()?;
            left = Node::or(left, right);
        }

        Ok(left)
    }

    /// Parses AND expressions: `term ("and" term)*`
    fn parse_and_expr(&mut self) -> FilterResult<Node> {
        let mut left = self.parse_term()?;

        while self.check(&Token::And) {
            self.advance(); // consume 'and'
            let right = self.parse_term()?;
            left = Node::and(left, right);
        }

        Ok(left)
    }

    /// Parses a group or a single predicate.
    fn parse_term(&mut self) -> FilterResult<Node> {
        if self.check(&Token::OpenParen) {
            let open = self.expect(&Token::OpenParen)?;
            self.enter()?;
            let inner = self.parse_expression()?;
            self.leave();
            if !self.check(&Token::CloseParen) {
                return match self.peek_positioned() {
                    None => Err(QuerySyntaxError::UnclosedParenthesis { position: open }),
                    Some(_) => Err(self.unexpected()),
                };
            }
            self.advance(); // consume ')'
            return Ok(Node::group(inner));
        }

        self.count_term()?;
        let subject_position = self.peek_positioned().map(|pt| pt.position);
        let left = self.parse_value()?;

        match self.peek() {
            Some(Token::Comparison(op)) => {
                let op = *op;
                self.advance();
                let right = self.parse_value()?;
                Ok(Node::compare(left, op, right))
            }
            Some(Token::Is) => {
                let field = Self::subject_field(left, subject_position)?;
                self.advance(); // consume 'is'
                let negated = self.check(&Token::Not);
                if negated {
                    self.advance();
                }
                self.expect(&Token::Null)?;
                Ok(Node::Null { field, negated })
            }
            Some(Token::In) => {
                let field = Self::subject_field(left, subject_position)?;
                self.advance(); // consume 'in'
                let values = self.parse_value_list()?;
                Ok(Node::In {
                    field,
                    negated: false,
                    values,
                })
            }
            Some(Token::Not) => {
                let field = Self::subject_field(left, subject_position)?;
                self.advance(); // consume 'not'
                self.expect(&Token::In)?;
                let values = self.parse_value_list()?;
                Ok(Node::In {
                    field,
                    negated: true,
                    values,
                })
            }
            Some(Token::NotIn) => {
                let field = Self::subject_field(left, subject_position)?;
                self.advance(); // consume '!=[]'
                let values = self.parse_value_list()?;
                Ok(Node::In {
                    field,
                    negated: true,
                    values,
                })
            }
            // A value with no operator after it, e.g. `x and 1`
            _ => Err(self.unexpected()),
        }
    }

    /// The subject of `in` and `is null` must be a plain field.
    fn subject_field(operand: Operand, position: Option<usize>) -> FilterResult<String> {
        match operand {
            Operand::Field(name) => Ok(name),
            Operand::Literal(literal) => Err(QuerySyntaxError::unexpected_token(
                literal.to_string(),
                position.unwrap_or_default(),
            )),
            Operand::Function { name, .. } => Err(QuerySyntaxError::unexpected_token(
                name,
                position.unwrap_or_default(),
            )),
        }
    }

    /// Parses `"(" literal ("," literal)* ")"`.
    fn parse_value_list(&mut self) -> FilterResult<Vec<Literal>> {
        let open = self.expect(&Token::OpenParen)?;
        if self.check(&Token::CloseParen) {
            return Err(QuerySyntaxError::EmptyInList { position: open });
        }

        let mut values = vec![self.parse_literal()?];
        while self.check(&Token::Comma) {
            self.advance();
            values.push(self.parse_literal()?);
        }

        if self.peek().is_none() {
            return Err(QuerySyntaxError::UnclosedParenthesis { position: open });
        }
        self.expect(&Token::CloseParen)?;
        Ok(values)
    }

    fn parse_literal(&mut self) -> FilterResult<Literal> {
        let literal = match self.peek() {
            Some(Token::Integer(n)) => Literal::Integer(*n),
            Some(Token::Float(n)) => Literal::Float(*n),
            Some(Token::String(s)) => Literal::String(s.clone()),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(literal)
    }

    /// Parses `field | literal | call`.
    fn parse_value(&mut self) -> FilterResult<Operand> {
        if let Some(Token::Identifier(name)) = self.peek() {
            let name = name.clone();
            self.advance();
            if self.check(&Token::OpenParen) {
                return self.parse_call(name);
            }
            return Ok(Operand::Field(name));
        }

        self.parse_literal().map(Operand::Literal)
    }

    /// Parses the argument list of a call; the name is already consumed.
    fn parse_call(&mut self, name: String) -> FilterResult<Operand> {
        let open = self.expect(&Token::OpenParen)?;
        self.enter()?;

        let mut args = Vec::new();
        if !self.check(&Token::CloseParen) {
            args.push(self.parse_value()?);
            while self.check(&Token::Comma) {
                self.advance();
                args.push(self.parse_value()?);
            }
        }

        if self.peek().is_none() {
            return Err(QuerySyntaxError::UnclosedParenthesis { position: open });
        }
        self.expect(&Token::CloseParen)?;
        self.leave();

        Ok(Operand::Function { name, args })
    }
}
