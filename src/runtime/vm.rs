use crate::bytecode::{Op, Program};
use crate::runtime::runtime_error::RuntimeError;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Upper bound on operand stack depth. Compiled programs never get near
    /// it; decoded ones might.
    pub max_stack_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_stack_depth: 10_000,
        }
    }
}

/// Register state for one evaluation.
///
/// Created fresh by every `interpret` call, so concurrent evaluations of the
/// same loaded program never share registers or stack.
#[derive(Debug, Default)]
struct Machine {
    r0: f64,
    r1: f64,
    stack: Vec<f64>,
}

/// Holds one loaded program and evaluates it against argument vectors.
pub struct Vm {
    program: Option<Program>,
    config: VmConfig,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            program: None,
            config,
        }
    }

    /// Replace the loaded program. No validation happens here.
    pub fn load(&mut self, program: Program) {
        trace!(instructions = program.len(), arity = program.arity, "loaded program");
        self.program = Some(program);
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Run the loaded program once and return r0.
    ///
    /// Extra arguments beyond the arity are ignored. Division by zero follows
    /// IEEE-754 and is not an error.
    pub fn interpret(&self, args: &[f64]) -> Result<f64, RuntimeError> {
        let program = self.program.as_ref().ok_or(RuntimeError::NoProgram)?;

        if args.len() < program.arity {
            return Err(RuntimeError::ArityMismatch {
                expected: program.arity,
                got: args.len(),
            });
        }

        let mut m = Machine {
            stack: Vec::with_capacity(16),
            ..Machine::default()
        };

        for (ip, op) in program.ops.iter().enumerate() {
            match *op {
                Op::Imm(v) => m.r0 = v,
                Op::LoadArg(index) => {
                    m.r0 = *args.get(index).ok_or(RuntimeError::ArgumentOutOfRange {
                        index,
                        len: args.len(),
                        ip,
                    })?;
                }
                Op::Push => {
                    if m.stack.len() >= self.config.max_stack_depth {
                        return Err(RuntimeError::StackOverflow {
                            limit: self.config.max_stack_depth,
                            ip,
                        });
                    }
                    m.stack.push(m.r0);
                }
                Op::Swap => std::mem::swap(&mut m.r0, &mut m.r1),
                Op::Pop => m.r0 = m.stack.pop().ok_or(RuntimeError::StackUnderflow { ip })?,
                Op::Add => m.r0 += m.r1,
                Op::Sub => m.r0 -= m.r1,
                Op::Mul => m.r0 *= m.r1,
                Op::Div => m.r0 /= m.r1,
            }
        }

        Ok(m.r0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Compiler;

    // ============================================================
    // Test Helpers
    // ============================================================

    /// Run raw ops with the given arity and arguments
    fn run_ops(ops: Vec<Op>, arity: usize, args: &[f64]) -> Result<f64, RuntimeError> {
        let mut vm = Vm::new();
        vm.load(Program::new(ops, arity));
        vm.interpret(args)
    }

    /// Compile, load and evaluate
    fn eval(source: &str, args: &[f64]) -> f64 {
        let mut vm = Vm::new();
        vm.load(Compiler::new().compile(source).expect("compile should succeed"));
        vm.interpret(args).expect("execution should succeed")
    }

    #[test]
    fn test_empty_program_returns_zero() {
        assert_eq!(run_ops(vec![], 0, &[]), Ok(0.0));
    }

    #[test]
    fn test_imm() {
        assert_eq!(run_ops(vec![Op::Imm(4.5)], 0, &[]), Ok(4.5));
    }

    #[test]
    fn test_load_arg() {
        assert_eq!(run_ops(vec![Op::LoadArg(1)], 2, &[7.0, 9.0]), Ok(9.0));
    }

    #[test]
    fn test_swap_exchanges_registers() {
        // r0 = 3, swap -> r1 = 3, r0 = 0; r0 = 1; r0 - r1 = -2
        let ops = vec![Op::Imm(3.0), Op::Swap, Op::Imm(1.0), Op::Sub];
        assert_eq!(run_ops(ops, 0, &[]), Ok(-2.0));
    }

    #[test]
    fn test_push_pop_restores() {
        let ops = vec![Op::Imm(8.0), Op::Push, Op::Imm(1.0), Op::Pop];
        assert_eq!(run_ops(ops, 0, &[]), Ok(8.0));
    }

    #[test]
    fn test_arith_uses_r0_op_r1() {
        let ops = vec![
            Op::Imm(20.0),
            Op::Push,
            Op::Imm(4.0),
            Op::Swap,
            Op::Pop,
            Op::Div,
        ];
        assert_eq!(run_ops(ops, 0, &[]), Ok(5.0));
    }

    #[test]
    fn test_pop_empty_stack() {
        assert_eq!(
            run_ops(vec![Op::Imm(1.0), Op::Pop], 0, &[]),
            Err(RuntimeError::StackUnderflow { ip: 1 })
        );
    }

    #[test]
    fn test_no_program() {
        let vm = Vm::new();
        assert_eq!(vm.interpret(&[1.0]), Err(RuntimeError::NoProgram));
    }

    #[test]
    fn test_arity_mismatch() {
        let mut vm = Vm::new();
        vm.load(Compiler::new().compile("[x y] x*y").unwrap());
        let err = vm.interpret(&[2.0]).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::ArityMismatch {
                expected: 2,
                got: 1
            }
        );
        assert_eq!(err.to_string(), "runtime error: expected 2 arguments, got 1");
    }

    #[test]
    fn test_extra_arguments_ignored() {
        assert_eq!(eval("[x] x+1", &[1.0, 99.0, 100.0]), 2.0);
    }

    #[test]
    fn test_argument_out_of_range_in_hand_built_program() {
        assert_eq!(
            run_ops(vec![Op::LoadArg(3)], 1, &[1.0]),
            Err(RuntimeError::ArgumentOutOfRange {
                index: 3,
                len: 1,
                ip: 0
            })
        );
    }

    #[test]
    fn test_stack_limit() {
        let mut vm = Vm::with_config(VmConfig { max_stack_depth: 2 });
        vm.load(Program::new(vec![Op::Push, Op::Push, Op::Push], 0));
        assert_eq!(
            vm.interpret(&[]),
            Err(RuntimeError::StackOverflow { limit: 2, ip: 2 })
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("[x] 2+3*4", &[0.0]), 14.0);
        assert_eq!(eval("[x] (2+3)*4", &[123.0]), 20.0);
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(eval("[] 10-3-2", &[]), 5.0);
        assert_eq!(eval("[a b c] a-b-c", &[10.0, 3.0, 2.0]), 5.0);
        assert_eq!(eval("[a b c] a/b/c", &[24.0, 4.0, 2.0]), 3.0);
    }

    #[test]
    fn test_right_nested() {
        assert_eq!(eval("[a b c d] a-(b-(c-d))", &[10.0, 5.0, 3.0, 1.0]), 7.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("[x] x/0", &[5.0]), f64::INFINITY);
        assert_eq!(eval("[x] 0-x/0", &[5.0]), f64::NEG_INFINITY);
        assert!(eval("[x] x/0", &[0.0]).is_nan());
    }

    #[test]
    fn test_reuse_across_argument_vectors() {
        let mut vm = Vm::new();
        vm.load(Compiler::new().compile("[x y] x*y").unwrap());
        assert_eq!(vm.interpret(&[2.0, 3.0]), Ok(6.0));
        assert_eq!(vm.interpret(&[5.0, 5.0]), Ok(25.0));
    }

    #[test]
    fn test_load_replaces_program() {
        let compiler = Compiler::new();
        let mut vm = Vm::new();
        vm.load(compiler.compile("[x] x+1").unwrap());
        vm.load(compiler.compile("[x] x*10").unwrap());
        assert_eq!(vm.interpret(&[3.0]), Ok(30.0));
    }

    #[test]
    fn test_concurrent_interpret_shares_program() {
        let mut vm = Vm::new();
        vm.load(Compiler::new().compile("[a b] (a+b)*(a-b)").unwrap());
        let vm = &vm;

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    s.spawn(move || {
                        let a = f64::from(i) + 2.0;
                        vm.interpret(&[a, 1.0]).unwrap()
                    })
                })
                .collect();
            for (i, h) in handles.into_iter().enumerate() {
                let a = i as f64 + 2.0;
                assert_eq!(h.join().unwrap(), a * a - 1.0);
            }
        });
    }
}
