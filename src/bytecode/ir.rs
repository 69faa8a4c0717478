use crate::bytecode::Op;
use serde::{Deserialize, Serialize};

/// A compiled function: a linear instruction stream plus the number of
/// parameters it was compiled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub ops: Vec<Op>,

    /// Length of the declared parameter list.
    pub arity: usize,
}

impl Program {
    pub fn new(ops: Vec<Op>, arity: usize) -> Self {
        Self { ops, arity }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Encode with postcard for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decode a program written by [`Program::to_bytes`].
    ///
    /// The result is not verified; run
    /// [`check_program`](crate::bytecode::stack_check_error::check_program)
    /// before loading untrusted bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl std::fmt::Display for Program {
    /// Mnemonics joined with ` | `, e.g. `IM 5 | PU | AR 0 | SW | PO | AD`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing() {
        let program = Program::new(
            vec![
                Op::Imm(5.0),
                Op::Push,
                Op::LoadArg(0),
                Op::Swap,
                Op::Pop,
                Op::Add,
            ],
            1,
        );
        assert_eq!(program.to_string(), "IM 5 | PU | AR 0 | SW | PO | AD");
    }

    #[test]
    fn test_fractional_immediate() {
        let program = Program::new(vec![Op::Imm(2.5)], 0);
        assert_eq!(program.to_string(), "IM 2.5");
    }

    #[test]
    fn test_postcard_bytes() {
        let program = Program::new(
            vec![Op::LoadArg(1), Op::Push, Op::Imm(0.5), Op::Swap, Op::Pop, Op::Mul],
            2,
        );
        let bytes = program.to_bytes().unwrap();
        assert_eq!(Program::from_bytes(&bytes).unwrap(), program);
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let program = Program::new(vec![Op::Imm(1.0), Op::Push, Op::Pop], 0);
        let bytes = program.to_bytes().unwrap();
        assert!(Program::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }
}
