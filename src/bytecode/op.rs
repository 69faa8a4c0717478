use serde::{Deserialize, Serialize};

use crate::lang::BinOp;

// =============================================================================
// OP - Machine instructions
// =============================================================================
//
// Two registers (r0, r1) and one operand stack. Every expression leaves its
// result in r0. There are no jumps: a program runs once from first to last
// instruction.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // register loads
    /// r0 := value
    Imm(f64),
    /// r0 := args[index]
    LoadArg(usize),

    // stack / register shuffles
    /// push r0
    Push,
    /// r0 <-> r1
    Swap,
    /// r0 := pop
    Pop,

    // arithmetic, r0 := r0 op r1
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    /// Arithmetic instruction for a tree operator.
    pub fn arith(op: BinOp) -> Self {
        match op {
            BinOp::Add => Op::Add,
            BinOp::Sub => Op::Sub,
            BinOp::Mul => Op::Mul,
            BinOp::Div => Op::Div,
        }
    }

    /// Two-letter mnemonic, without operand.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Imm(_) => "IM",
            Op::LoadArg(_) => "AR",
            Op::Push => "PU",
            Op::Swap => "SW",
            Op::Pop => "PO",
            Op::Add => "AD",
            Op::Sub => "SU",
            Op::Mul => "MU",
            Op::Div => "DI",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Imm(v) => write!(f, "{} {}", self.mnemonic(), v),
            Op::LoadArg(i) => write!(f, "{} {}", self.mnemonic(), i),
            _ => f.write_str(self.mnemonic()),
        }
    }
}
