pub mod lexer;
pub mod parser;
pub mod parser_error;
pub mod token;

pub use parser::{Parser, parse_function};
pub use parser_error::{ParseErrorKind, ParserError};
