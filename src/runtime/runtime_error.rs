#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// `interpret` was called before any program was loaded.
    NoProgram,
    /// Fewer arguments than the program's parameter count.
    ArityMismatch { expected: usize, got: usize },
    /// `AR` referenced an argument that was not supplied.
    ArgumentOutOfRange { index: usize, len: usize, ip: usize },
    /// `PO` on an empty stack.
    StackUnderflow { ip: usize },
    /// Stack grew past the configured limit.
    StackOverflow { limit: usize, ip: usize },
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: ")?;
        match self {
            RuntimeError::NoProgram => write!(f, "no program loaded"),
            RuntimeError::ArityMismatch { expected, got } => write!(
                f,
                "expected {} argument{}, got {}",
                expected,
                if *expected == 1 { "" } else { "s" },
                got
            ),
            RuntimeError::ArgumentOutOfRange { index, len, ip } => write!(
                f,
                "argument index {} out of bounds (have {}) at {:04}",
                index, len, ip
            ),
            RuntimeError::StackUnderflow { ip } => write!(f, "stack underflow at {:04}", ip),
            RuntimeError::StackOverflow { limit, ip } => {
                write!(f, "stack size limit exceeded ({}) at {:04}", limit, ip)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
