//! # regcalc
//!
//! Compiles one-line arithmetic functions such as `[x y] x*y + 2` into a flat
//! instruction sequence for a two-register, one-stack machine, then evaluates
//! that sequence against any number of argument vectors.
//!
//! ```
//! use regcalc::{Vm, compile};
//!
//! let mut vm = Vm::new();
//! vm.load(compile("[x y] x*y").unwrap());
//! assert_eq!(vm.interpret(&[2.0, 3.0]).unwrap(), 6.0);
//! assert_eq!(vm.interpret(&[5.0, 5.0]).unwrap(), 25.0);
//! ```

pub mod bytecode;
pub mod frontend;
pub mod lang;
pub mod runtime;

pub use bytecode::{CompileError, Compiler, CompilerConfig, Op, Program};
pub use runtime::{RuntimeError, Vm, VmConfig};

/// Compile `source` with the default configuration.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    Compiler::new().compile(source)
}
