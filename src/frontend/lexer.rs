use crate::frontend::token::Token;

/// 1-based source position of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for LexerError {}

/// Scanner over a function definition.
///
/// All state lives in the struct; whitespace is skipped before every token.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reads `digits ('.' digits)?`. A dot without a following digit is left
    /// in the input.
    fn read_number(&mut self) -> Result<Token, LexerError> {
        let start = self.span();

        let mut digits = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    has_dot = true;
                    digits.push('.');
                    self.advance();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        let value: f64 = digits.parse().map_err(|_| LexerError {
            message: format!("invalid number: {}", digits),
            line: start.line,
            col: start.col,
        })?;
        Ok(Token::Number(value))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphabetic() {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::Ident(ident)
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexerError> {
        self.skip_whitespace();
        let span = self.span();

        let token = match self.current() {
            None => Token::Eof,
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_ascii_alphabetic() => self.read_identifier(),
            Some(ch) => {
                let token = match ch {
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    other => {
                        return Err(LexerError {
                            message: format!("unexpected character '{}'", other),
                            line: span.line,
                            col: span.col,
                        });
                    }
                };
                self.advance();
                token
            }
        };

        Ok(Spanned { token, span })
    }

    /// Tokenizes the whole input. The result always ends with `Token::Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = matches!(spanned.token, Token::Eof);
            tokens.push(spanned);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}
