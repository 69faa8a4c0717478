use crate::frontend::lexer::{Lexer, Span, Spanned};
use crate::frontend::parser_error::{ParseErrorKind, ParserError};
use crate::frontend::token::Token;
use crate::lang::{BinOp, Function, Node};

const ADDITIVE: [(Token, BinOp); 2] = [(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)];
const MULTIPLICATIVE: [(Token, BinOp); 2] =
    [(Token::Star, BinOp::Mul), (Token::Slash, BinOp::Div)];

/// Deepest expression accepted unless configured otherwise. Bounds both tree
/// height and parenthesis nesting, so later tree walks stay shallow.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A parsed subtree and its height; a leaf has height 1.
type Parsed = (Node, usize);

/// Recursive-descent parser for function definitions.
///
/// Grammar:
///
/// ```text
/// function   ::= '[' params ']' expression
/// params     ::= (variable (','? variable)*)?
/// expression ::= term (('+' | '-') term)*
/// term       ::= factor (('*' | '/') factor)*
/// factor     ::= number | variable | '(' expression ')'
/// ```
///
/// One token of lookahead decides every choice. `match_*` helpers return
/// `None` without consuming anything when the next token does not fit, so the
/// caller can try the next alternative; `Err` is reserved for input that
/// cannot be a function at all.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Parameter names in declaration order; a name's position is its
    /// argument index.
    params: Vec<String>,
    max_depth: usize,
    /// Open parentheses at the current position.
    nesting: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Spanned>) -> Self {
        if !matches!(tokens.last().map(|s| &s.token), Some(Token::Eof)) {
            let span = tokens
                .last()
                .map(|s| s.span)
                .unwrap_or(Span { line: 1, col: 1 });
            tokens.push(Spanned {
                token: Token::Eof,
                span,
            });
        }
        Parser {
            tokens,
            pos: 0,
            params: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            nesting: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parameters declared so far. Still populated after a failed parse of
    /// the body, which lets callers explain unknown-variable errors.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    fn current(&self) -> &Spanned {
        // `new` guarantees a trailing Eof and `advance` never steps past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn advance(&mut self) -> Spanned {
        let spanned = self.current().clone();
        if !matches!(spanned.token, Token::Eof) {
            self.pos += 1;
        }
        spanned
    }

    /// Consumes `expected` if it is next.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParserError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    /// Error for the current token given what the grammar wanted here.
    fn unexpected(&self, expected: &str) -> ParserError {
        let spanned = self.current();
        let kind = match &spanned.token {
            Token::Eof => ParseErrorKind::UnexpectedEnd {
                expected: expected.to_string(),
            },
            other => ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: other.describe(),
            },
        };
        ParserError::new(kind, spanned.span.line, spanned.span.col)
    }

    fn too_deep(&self) -> ParserError {
        let span = self.current().span;
        ParserError::new(
            ParseErrorKind::TooDeep {
                limit: self.max_depth,
            },
            span.line,
            span.col,
        )
    }

    fn join(&self, op: BinOp, left: Parsed, right: Parsed) -> Result<Parsed, ParserError> {
        let height = left.1.max(right.1) + 1;
        if height > self.max_depth {
            return Err(self.too_deep());
        }
        Ok((Node::binary(op, left.0, right.0), height))
    }

    fn match_variable(&mut self) -> Option<(String, Span)> {
        if let Token::Ident(name) = self.peek() {
            let name = name.clone();
            let span = self.advance().span;
            Some((name, span))
        } else {
            None
        }
    }

    fn match_number(&mut self) -> Option<f64> {
        if let Token::Number(n) = *self.peek() {
            self.advance();
            Some(n)
        } else {
            None
        }
    }

    fn match_operator(&mut self, table: &[(Token, BinOp)]) -> Option<BinOp> {
        let op = table
            .iter()
            .find(|(token, _)| token == self.peek())
            .map(|(_, op)| *op)?;
        self.advance();
        Some(op)
    }

    /// Parses a complete function; the input must end after the body.
    pub fn parse_function(&mut self) -> Result<Function, ParserError> {
        self.expect(&Token::LBracket)?;
        self.params = self.parse_params()?;
        self.expect(&Token::RBracket)?;

        let (body, _) = self.parse_expression()?;

        let spanned = self.current();
        if !matches!(spanned.token, Token::Eof) {
            return Err(ParserError::new(
                ParseErrorKind::TrailingInput {
                    found: spanned.token.describe(),
                },
                spanned.span.line,
                spanned.span.col,
            ));
        }

        Ok(Function {
            params: std::mem::take(&mut self.params),
            body,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<String>, ParserError> {
        let mut params: Vec<String> = Vec::new();
        while let Some((name, span)) = self.match_variable() {
            if params.contains(&name) {
                return Err(ParserError::new(
                    ParseErrorKind::DuplicateParameter { name },
                    span.line,
                    span.col,
                ));
            }
            params.push(name);

            if self.eat(&Token::Comma) && !matches!(self.peek(), Token::Ident(_)) {
                return Err(self.unexpected("parameter name"));
            }
        }
        Ok(params)
    }

    fn parse_expression(&mut self) -> Result<Parsed, ParserError> {
        let mut node = self.parse_term()?;
        while let Some(op) = self.match_operator(&ADDITIVE) {
            let right = self.parse_term()?;
            node = self.join(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Parsed, ParserError> {
        let mut node = self.parse_factor()?;
        while let Some(op) = self.match_operator(&MULTIPLICATIVE) {
            let right = self.parse_factor()?;
            node = self.join(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<Parsed, ParserError> {
        if self.eat(&Token::LParen) {
            self.nesting += 1;
            if self.nesting > self.max_depth {
                return Err(self.too_deep());
            }
            let inner = self.parse_expression()?;
            self.expect(&Token::RParen)?;
            self.nesting -= 1;
            return Ok(inner);
        }

        if let Some(n) = self.match_number() {
            return Ok((Node::Immediate(n), 1));
        }

        if let Some((name, span)) = self.match_variable() {
            let index = self.resolve(name, span)?;
            return Ok((Node::Argument(index), 1));
        }

        Err(self.unexpected("number, variable or '('"))
    }

    fn resolve(&self, name: String, span: Span) -> Result<usize, ParserError> {
        self.params.iter().position(|p| *p == name).ok_or_else(|| {
            ParserError::new(ParseErrorKind::UnknownVariable { name }, span.line, span.col)
        })
    }
}

/// Tokenizes and parses `source` into a [`Function`].
pub fn parse_function(source: &str) -> Result<Function, ParserError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_function()
}
