use crate::frontend::{ParseErrorKind, ParserError};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The source is not a well-formed function.
    Syntax(ParserError),
    /// The body names a variable that is not a parameter.
    UnknownVariable {
        name: String,
        col: usize,
        hint: Option<String>,
    },
}

impl CompileError {
    pub fn unknown_variable(name: &str, col: usize, params: &[String]) -> Self {
        let hint = if params.is_empty() {
            Some(format!("declare it in the parameter list: [{}] ...", name))
        } else {
            Some(format!("declared parameters are: {}", params.join(", ")))
        };
        CompileError::UnknownVariable {
            name: name.to_string(),
            col,
            hint,
        }
    }

    /// Lift a parser error, attaching the declared `params` as a hint when a
    /// variable could not be resolved.
    pub fn from_parse(e: ParserError, params: &[String]) -> Self {
        match &e.kind {
            ParseErrorKind::UnknownVariable { name } => {
                CompileError::unknown_variable(name, e.col, params)
            }
            _ => CompileError::Syntax(e),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax(e) => write!(f, "compile error: {}", e),
            CompileError::UnknownVariable { name, col, hint } => {
                write!(f, "compile error: {}: unknown variable '{}'", col, name)?;
                if let Some(h) = hint {
                    write!(f, "\n  hint: {}", h)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Syntax(e) => Some(e),
            CompileError::UnknownVariable { .. } => None,
        }
    }
}
