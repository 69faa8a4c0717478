use crate::bytecode::{Op, Program};
use std::fmt::Write;

/// One-line listing, mnemonics joined with ` | `.
pub fn listing(program: &Program) -> String {
    program.to_string()
}

/// Numbered disassembly with the register/stack effect of each op.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "════════════════════════════════════════");
    let _ = writeln!(out, " arity {}", program.arity);
    let _ = writeln!(out, " {} instructions", program.len());
    let _ = writeln!(out, "════════════════════════════════════════");

    for (ip, op) in program.ops.iter().enumerate() {
        let _ = writeln!(out, "{:04}  {:<12}; {}", ip, op.to_string(), effect_comment(op));
    }

    out
}

fn effect_comment(op: &Op) -> String {
    match op {
        Op::Imm(v) => format!("r0 := {}", v),
        Op::LoadArg(i) => format!("r0 := args[{}]", i),
        Op::Push => "push r0".to_string(),
        Op::Swap => "r0 <-> r1".to_string(),
        Op::Pop => "r0 := pop".to_string(),
        Op::Add => "r0 := r0 + r1".to_string(),
        Op::Sub => "r0 := r0 - r1".to_string(),
        Op::Mul => "r0 := r0 * r1".to_string(),
        Op::Div => "r0 := r0 / r1".to_string(),
    }
}
