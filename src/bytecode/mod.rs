pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod fold;
pub mod ir;
pub mod op;
pub mod stack_check_error;

pub use compile::{Compiler, CompilerConfig, assemble};
pub use compile_error::CompileError;
pub use fold::fold;
pub use ir::Program;
pub use op::Op;
