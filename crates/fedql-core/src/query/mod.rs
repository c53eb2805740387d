/// Statement translation and predicate evaluation
///
/// Turns the supported SELECT subset into a `Query` and evaluates its predicates
/// against rows.
/// Query and predicate types
#[allow(missing_docs)]
pub mod ast;
/// Statement lexer
#[allow(missing_docs)]
pub mod lexer;
/// Statement parser
#[allow(missing_docs)]
pub mod parser;
/// Predicate evaluator
pub mod predicate;

// Re-export main types
pub use ast::*;
pub use lexer::{Keyword, Lexer, LexerError, Token};
pub use parser::{parse, ParseError, Parser, MAX_PAREN_DEPTH, MAX_PREDICATE_DEPTH};
pub use predicate::{filter_rows, like_to_pattern, required_equality};
