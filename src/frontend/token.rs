#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Ident(std::string::String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,

    // Delimiters
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,

    Eof,
}

impl Token {
    /// Short human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(name) => format!("variable '{}'", name),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}
