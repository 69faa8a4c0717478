use crate::bytecode::{Op, Program};

#[derive(Debug, Clone, PartialEq)]
pub struct StackCheckError {
    pub message: String,
    /// Instruction index the problem was found at, if any.
    pub ip: Option<usize>,
}

impl std::fmt::Display for StackCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ip {
            Some(ip) => write!(f, "stack-check error at {:04}: {}", ip, self.message),
            None => write!(f, "stack-check error: {}", self.message),
        }
    }
}

impl std::error::Error for StackCheckError {}

impl StackCheckError {
    fn new(message: impl Into<String>, ip: Option<usize>) -> Self {
        Self {
            message: message.into(),
            ip,
        }
    }
}

/// Returns (pops, pushes) on the operand stack for an op.
///
/// Register-only instructions leave the stack alone.
fn effect(op: &Op) -> (usize, usize) {
    match op {
        Op::Push => (0, 1),
        Op::Pop => (1, 0),
        Op::Imm(_) | Op::LoadArg(_) | Op::Swap => (0, 0),
        Op::Add | Op::Sub | Op::Mul | Op::Div => (0, 0),
    }
}

/// Statically verify a program before handing it to the machine.
///
/// Checks that no `PO` runs on an empty stack, that the stack is empty when
/// the program ends, and that every `AR` index is below the arity. Returns
/// the maximum stack depth reached.
///
/// Everything the code generator emits passes; this exists for programs that
/// come from elsewhere, such as decoded bytes.
pub fn check_program(program: &Program) -> Result<usize, StackCheckError> {
    let mut height: usize = 0;
    let mut max_height: usize = 0;

    for (ip, op) in program.ops.iter().enumerate() {
        if let Op::LoadArg(index) = op {
            if *index >= program.arity {
                return Err(StackCheckError::new(
                    format!(
                        "argument index {} out of range for arity {}",
                        index, program.arity
                    ),
                    Some(ip),
                ));
            }
        }

        let (pops, pushes) = effect(op);
        if height < pops {
            return Err(StackCheckError::new(
                format!("stack underflow: {} needs {}, have {}", op, pops, height),
                Some(ip),
            ));
        }
        height = height - pops + pushes;
        max_height = max_height.max(height);
    }

    if height != 0 {
        return Err(StackCheckError::new(
            format!("{} value(s) left on the stack at end of program", height),
            None,
        ));
    }

    Ok(max_height)
}
