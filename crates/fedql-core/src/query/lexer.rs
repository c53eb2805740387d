/// Statement tokenizer
///
/// Splits statement text into keywords, operators, literals and identifiers.
/// Keywords are matched case-insensitively; identifiers keep their spelling.
use std::fmt;

/// Reserved words.
///
/// Only part of this set is accepted by the parser; the rest is recognised so it
/// can be reported as unsupported instead of being mistaken for a column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    From,
    Where,
    Limit,
    And,
    Or,
    Like,
    Not,
    In,
    Between,
    Is,
    Null,
    Offset,
    OrderBy,
    Group,
    Having,
    Join,
    On,
    As,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("SELECT", Keyword::Select),
    ("FROM", Keyword::From),
    ("WHERE", Keyword::Where),
    ("LIMIT", Keyword::Limit),
    ("AND", Keyword::And),
    ("OR", Keyword::Or),
    ("LIKE", Keyword::Like),
    ("NOT", Keyword::Not),
    ("IN", Keyword::In),
    ("BETWEEN", Keyword::Between),
    ("IS", Keyword::Is),
    ("NULL", Keyword::Null),
    ("OFFSET", Keyword::Offset),
    ("ORDER BY", Keyword::OrderBy),
    ("GROUP", Keyword::Group),
    ("HAVING", Keyword::Having),
    ("JOIN", Keyword::Join),
    ("ON", Keyword::On),
    ("AS", Keyword::As),
];

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, keyword)| *keyword)
    }

    /// Canonical upper-case spelling
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }

    /// Whether the parser accepts this keyword
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Keyword::Select
                | Keyword::From
                | Keyword::Where
                | Keyword::Limit
                | Keyword::And
                | Keyword::Or
                | Keyword::Like
        )
    }
}

/// Lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Ident(String),
    Text(String),
    Number(i64),
    Equals,
    /// `!=` or `<>`
    NotEquals,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Star,
    Comma,
    OpenParen,
    CloseParen,
    Semicolon,
    End,
}

impl Token {
    /// Comparison operators outside the supported subset
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Token::Less | Token::LessEq | Token::Greater | Token::GreaterEq
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Token::Keyword(k) => k.as_str(),
            Token::Ident(name) => return write!(f, "{}", name),
            Token::Text(s) => return write!(f, "'{}'", s.replace('\'', "''")),
            Token::Number(n) => return write!(f, "{}", n),
            Token::Equals => "=",
            Token::NotEquals => "!=",
            Token::Less => "<",
            Token::LessEq => "<=",
            Token::Greater => ">",
            Token::GreaterEq => ">=",
            Token::Star => "*",
            Token::Comma => ",",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Semicolon => ";",
            Token::End => "end of input",
        };
        f.write_str(symbol)
    }
}

/// Tokenizer over one statement
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Read the next token; returns `Token::End` once input is exhausted
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.eat_while(char::is_whitespace);

        let Some(ch) = self.bump() else {
            return Ok(Token::End);
        };

        let token = match ch {
            '*' => Token::Star,
            ',' => Token::Comma,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ';' => Token::Semicolon,
            '=' => Token::Equals,
            '<' if self.bump_if('=') => Token::LessEq,
            '<' if self.bump_if('>') => Token::NotEquals,
            '<' => Token::Less,
            '>' if self.bump_if('=') => Token::GreaterEq,
            '>' => Token::Greater,
            '!' if self.bump_if('=') => Token::NotEquals,
            '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.number('-')?,
            '\'' => self.quoted()?,
            c if c.is_ascii_digit() => self.number(c)?,
            c if c.is_alphabetic() || c == '_' => self.word(c),
            c => return Err(LexerError::UnexpectedCharacter(c)),
        };

        Ok(token)
    }

    /// Tokenize the whole input; the last token is always `Token::End`
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::End {
                tokens.push(token);
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn number(&mut self, first: char) -> Result<Token, LexerError> {
        let mut digits = first.to_string();
        digits.push_str(&self.eat_while(|c| c.is_ascii_digit()));
        digits
            .parse()
            .map(Token::Number)
            .map_err(|_| LexerError::InvalidNumber(digits))
    }

    /// Body of a `'...'` literal; `''` stands for one quote
    fn quoted(&mut self) -> Result<Token, LexerError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(LexerError::UnterminatedString),
                Some('\'') if self.bump_if('\'') => text.push('\''),
                Some('\'') => return Ok(Token::Text(text)),
                Some(c) => text.push(c),
            }
        }
    }

    fn word(&mut self, first: char) -> Token {
        let mut word = first.to_string();
        word.push_str(&self.eat_while(|c| c.is_alphanumeric() || c == '_' || c == '.'));

        if word.eq_ignore_ascii_case("ORDER") && self.followed_by_word("BY") {
            return Token::Keyword(Keyword::OrderBy);
        }

        match Keyword::lookup(&word) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(word),
        }
    }

    /// Consume the next word if it equals `expected`, otherwise leave input untouched
    fn followed_by_word(&mut self, expected: &str) -> bool {
        let mark = self.pos;
        self.eat_while(char::is_whitespace);
        let next = self.eat_while(char::is_alphabetic);
        if next.eq_ignore_ascii_case(expected) {
            true
        } else {
            self.pos = mark;
            false
        }
    }
}

/// Tokenizer errors
#[derive(Debug, Clone, PartialEq)]
pub enum LexerError {
    UnexpectedCharacter(char),
    InvalidNumber(String),
    UnterminatedString,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter(ch) => write!(f, "Unexpected character '{}'", ch),
            LexerError::InvalidNumber(s) => write!(f, "Number out of range: {}", s),
            LexerError::UnterminatedString => write!(f, "String literal is missing its closing quote"),
        }
    }
}

impl std::error::Error for LexerError {}
