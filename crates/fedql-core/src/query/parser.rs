/// Parser for the fedql statement subset
///
/// Recursive descent over the token stream, building the `Query` and its predicate
/// trees bottom-up.
///
/// ```text
/// statement := SELECT ('*' | column (',' column)*) FROM source '.' table
///              [WHERE or_expr] [LIMIT integer] [';' ...]
/// or_expr   := and_expr (OR and_expr)*
/// and_expr  := primary (AND primary)*
/// primary   := '(' or_expr ')' | operand ('=' | '!=' | '<>') operand | column LIKE 'pattern'
/// ```
use super::ast::*;
use super::lexer::{Keyword, Lexer, LexerError, Token};
use std::fmt;

/// Parse a single statement into a `Query`
pub fn parse(statement: &str) -> Result<Query, ParseError> {
    Parser::new(statement)?.parse()
}

/// Deepest run of nested parentheses accepted in a WHERE clause
pub const MAX_PAREN_DEPTH: usize = 128;

/// Tallest predicate tree accepted; long AND/OR chains fold into one level per operator
pub const MAX_PREDICATE_DEPTH: usize = 1024;

/// Parser for SELECT statements
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    paren_depth: usize,
}

/// One side of a comparison
enum Operand {
    Column(String),
    Literal(String),
}

impl Parser {
    /// Create a new parser from statement text
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize().map_err(ParseError::LexerError)?;
        Ok(Self {
            tokens,
            position: 0,
            paren_depth: 0,
        })
    }

    /// Parse the first statement into a `Query`
    ///
    /// Anything after the first `;` is discarded.
    pub fn parse(&mut self) -> Result<Query, ParseError> {
        let columns = self.parse_select()?;
        let (source_name, table) = self.parse_from()?;
        let filters = self.parse_where()?;
        let limit = self.parse_limit()?;

        self.finish_statement()?;

        Ok(Query {
            source_name,
            table,
            columns,
            limit,
            filters,
        })
    }

    fn parse_select(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_token(Token::Keyword(Keyword::Select))?;

        if self.current_token() == &Token::Star {
            self.advance();
            return Ok(Vec::new());
        }

        if self.current_token() == &Token::Keyword(Keyword::From) {
            return Err(ParseError::EmptySelectList);
        }

        let mut columns = Vec::new();

        loop {
            if let Token::Ident(name) = self.current_token() {
                columns.push(name.to_lowercase());
                self.advance();
            } else {
                return Err(self.unexpected("column name"));
            }

            if self.current_token() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        Ok(columns)
    }

    fn parse_from(&mut self) -> Result<(String, String), ParseError> {
        self.expect_token(Token::Keyword(Keyword::From))?;

        let name = if let Token::Ident(name) = self.current_token() {
            name.to_lowercase()
        } else {
            return Err(self.unexpected("source.table"));
        };
        self.advance();

        let mut parts = name.split('.');
        let (source, table) = match (parts.next(), parts.next(), parts.next()) {
            (Some(source), Some(table), None) if !source.is_empty() && !table.is_empty() => {
                (source.to_string(), table.to_string())
            }
            _ => return Err(ParseError::UnqualifiedTable(name)),
        };

        if self.current_token() == &Token::Comma {
            return Err(ParseError::UnsupportedOperator(
                "multiple tables in FROM".to_string(),
            ));
        }

        Ok((source, table))
    }

    fn parse_where(&mut self) -> Result<Vec<Predicate>, ParseError> {
        if self.current_token() != &Token::Keyword(Keyword::Where) {
            return Ok(Vec::new());
        }

        self.advance();
        let (predicate, _) = self.parse_or()?;
        Ok(vec![predicate])
    }

    // Each parse_* below returns the predicate with its tree height.

    fn parse_or(&mut self) -> Result<(Predicate, usize), ParseError> {
        let (mut left, mut height) = self.parse_and()?;

        while self.current_token() == &Token::Keyword(Keyword::Or) {
            self.advance();
            let (right, right_height) = self.parse_and()?;
            height = join_height(height, right_height)?;
            left = Predicate::or(vec![left, right]);
        }

        Ok((left, height))
    }

    fn parse_and(&mut self) -> Result<(Predicate, usize), ParseError> {
        let (mut left, mut height) = self.parse_primary()?;

        while self.current_token() == &Token::Keyword(Keyword::And) {
            self.advance();
            let (right, right_height) = self.parse_primary()?;
            height = join_height(height, right_height)?;
            left = Predicate::and(vec![left, right]);
        }

        Ok((left, height))
    }

    fn parse_primary(&mut self) -> Result<(Predicate, usize), ParseError> {
        if self.current_token() == &Token::OpenParen {
            if self.paren_depth == MAX_PAREN_DEPTH {
                return Err(ParseError::NestingTooDeep(MAX_PAREN_DEPTH));
            }
            self.advance();
            self.paren_depth += 1;
            let inner = self.parse_or()?;
            self.paren_depth -= 1;
            self.expect_token(Token::CloseParen)?;
            return Ok(inner);
        }

        if let Some(err) = self.unsupported() {
            return Err(err);
        }

        let left = self.parse_operand()?;

        let predicate = match self.current_token().clone() {
            Token::Equals => {
                self.advance();
                let right = self.parse_operand()?;
                comparison(ComparisonOp::Eq, left, right)
            }
            Token::NotEquals => {
                self.advance();
                let right = self.parse_operand()?;
                comparison(ComparisonOp::Ne, left, right)
            }
            Token::Keyword(Keyword::Like) => {
                self.advance();
                let pattern = self.parse_operand()?;
                match (left, pattern) {
                    (Operand::Column(field), Operand::Literal(pattern)) => {
                        Ok(Predicate::like(field, &pattern))
                    }
                    _ => Err(ParseError::InvalidComparison(
                        "LIKE needs a column on the left and a pattern on the right".to_string(),
                    )),
                }
            }
            _ => Err(self
                .unsupported()
                .unwrap_or_else(|| self.unexpected("comparison operator"))),
        }?;

        Ok((predicate, 1))
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        let operand = match self.current_token() {
            Token::Ident(name) => Operand::Column(name.to_lowercase()),
            Token::Text(s) => Operand::Literal(s.clone()),
            Token::Number(i) => Operand::Literal(i.to_string()),
            _ => {
                return Err(self
                    .unsupported()
                    .unwrap_or_else(|| self.unexpected("column or literal")))
            }
        };
        self.advance();
        Ok(operand)
    }

    fn parse_limit(&mut self) -> Result<usize, ParseError> {
        if self.current_token() != &Token::Keyword(Keyword::Limit) {
            return Ok(0);
        }

        self.advance();

        let limit = if let Token::Number(n) = self.current_token() {
            if *n < 0 {
                return Err(ParseError::InvalidLimitValue(*n));
            }
            *n as usize
        } else {
            return Err(self.unexpected("integer"));
        };
        self.advance();

        if self.current_token() == &Token::Keyword(Keyword::Offset) {
            return Err(ParseError::UnsupportedOperator("OFFSET".to_string()));
        }

        Ok(limit)
    }

    fn finish_statement(&mut self) -> Result<(), ParseError> {
        match self.current_token() {
            Token::End => Ok(()),
            Token::Semicolon => {
                let discarded = self.tokens.len() - self.position - 2;
                if discarded > 0 {
                    tracing::debug!(discarded, "ignoring tokens after the first statement");
                }
                Ok(())
            }
            _ => Err(self
                .unsupported()
                .unwrap_or_else(|| self.unexpected("end of statement"))),
        }
    }

    /// Tokens that are valid SQL but outside the supported subset
    fn unsupported(&self) -> Option<ParseError> {
        let token = self.current_token();
        let rejected = match token {
            Token::Keyword(keyword) => !keyword.is_supported(),
            other => other.is_ordering(),
        };
        rejected.then(|| ParseError::UnsupportedOperator(token.to_string()))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current_token().clone(),
        }
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.current_token() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self
                .unsupported()
                .unwrap_or_else(|| self.unexpected(&expected.to_string())))
        }
    }
}

/// Height of a logical node over two subtrees
fn join_height(left: usize, right: usize) -> Result<usize, ParseError> {
    let height = left.max(right) + 1;
    if height > MAX_PREDICATE_DEPTH {
        return Err(ParseError::NestingTooDeep(MAX_PREDICATE_DEPTH));
    }
    Ok(height)
}

/// Build `field op value` from operands given in either order
fn comparison(op: ComparisonOp, left: Operand, right: Operand) -> Result<Predicate, ParseError> {
    let (field, value) = match (left, right) {
        (Operand::Column(field), Operand::Literal(value))
        | (Operand::Literal(value), Operand::Column(field)) => (field, value),
        (Operand::Column(a), Operand::Column(b)) => {
            return Err(ParseError::InvalidComparison(format!(
                "cannot compare column '{}' with column '{}'",
                a, b
            )))
        }
        (Operand::Literal(a), Operand::Literal(b)) => {
            return Err(ParseError::InvalidComparison(format!(
                "cannot compare literal '{}' with literal '{}'",
                a, b
            )))
        }
    };

    if value.is_empty() {
        return Err(ParseError::InvalidComparison(format!(
            "empty literal compared with '{}'",
            field
        )));
    }

    Ok(Predicate::Comparison { op, field, value })
}

/// Parser errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    LexerError(LexerError),
    UnexpectedToken { expected: String, found: Token },
    EmptySelectList,
    UnqualifiedTable(String),
    UnsupportedOperator(String),
    InvalidComparison(String),
    InvalidLimitValue(i64),
    NestingTooDeep(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::LexerError(e) => write!(f, "Lexer error: {}", e),
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "Expected {}, found {}", expected, found)
            }
            ParseError::EmptySelectList => write!(f, "SELECT list cannot be empty"),
            ParseError::UnqualifiedTable(name) => {
                write!(f, "Table '{}' must be written as source.table", name)
            }
            ParseError::UnsupportedOperator(op) => write!(f, "Unsupported operator: {}", op),
            ParseError::InvalidComparison(msg) => write!(f, "Invalid comparison: {}", msg),
            ParseError::InvalidLimitValue(n) => {
                write!(f, "Invalid LIMIT value: {} (must be non-negative)", n)
            }
            ParseError::NestingTooDeep(limit) => {
                write!(f, "WHERE clause nests deeper than {} levels", limit)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::LexerError(e) => Some(e),
            _ => None,
        }
    }
}
