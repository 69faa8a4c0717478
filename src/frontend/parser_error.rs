use crate::frontend::lexer::LexerError;

/// What went wrong while parsing a function definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// The scanner rejected a character.
    Lex,
    /// A token did not fit the grammar at this point.
    UnexpectedToken { expected: String, found: String },
    /// Input ended where more was required.
    UnexpectedEnd { expected: String },
    /// A complete expression was followed by more tokens.
    TrailingInput { found: String },
    /// A variable that is not in the parameter list.
    UnknownVariable { name: String },
    /// The same name declared twice in the parameter list.
    DuplicateParameter { name: String },
    /// Expression nesting or tree height over the configured limit.
    TooDeep { limit: usize },
}

/// A parsing error with source location.
///
/// `line` and `col` are 1-based positions coming from the lexer spans.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ParserError {
    pub fn new(kind: ParseErrorKind, line: usize, col: usize) -> Self {
        let message = match &kind {
            ParseErrorKind::Lex => "invalid input".to_string(),
            ParseErrorKind::UnexpectedToken { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            ParseErrorKind::UnexpectedEnd { expected } => {
                format!("expected {}, found end of input", expected)
            }
            ParseErrorKind::TrailingInput { found } => {
                format!("unexpected {} after expression", found)
            }
            ParseErrorKind::UnknownVariable { name } => {
                format!("unknown variable '{}'", name)
            }
            ParseErrorKind::DuplicateParameter { name } => {
                format!("parameter '{}' declared more than once", name)
            }
            ParseErrorKind::TooDeep { limit } => {
                format!("expression nested deeper than {} levels", limit)
            }
        };
        ParserError {
            kind,
            message,
            line,
            col,
        }
    }
}

impl From<LexerError> for ParserError {
    fn from(e: LexerError) -> Self {
        ParserError {
            kind: ParseErrorKind::Lex,
            message: e.message,
            line: e.line,
            col: e.col,
        }
    }
}

impl std::fmt::Display for ParserError {
    /// Formats as `line:col: message` for CLI-friendly diagnostics.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ParserError {}
