use tracing::{debug, instrument, trace};

use crate::{
    bytecode::{Op, Program, compile_error::CompileError, fold::fold},
    frontend::{
        ParserError,
        lexer::Lexer,
        parser::{DEFAULT_MAX_DEPTH, Parser},
    },
    lang::{Function, Node},
};

/// Knobs for the compile pipeline.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Run constant folding before code generation.
    pub fold_constants: bool,

    /// Deepest expression the parser accepts, counting both tree height and
    /// parenthesis nesting. Folding and code generation recurse over the
    /// tree, so this bounds their stack use too.
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            fold_constants: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Drives source text through parse, fold and assemble.
///
/// A `Compiler` holds only configuration, so one instance can compile any
/// number of functions.
pub struct Compiler {
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Parse `source` and, if enabled, fold constants in its body.
    pub fn compile_ast(&self, source: &str) -> Result<Function, CompileError> {
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|e| CompileError::from_parse(ParserError::from(e), &[]))?;

        let mut parser = Parser::new(tokens).with_max_depth(self.config.max_depth);
        let function = parser
            .parse_function()
            .map_err(|e| CompileError::from_parse(e, parser.params()))?;

        if !self.config.fold_constants {
            return Ok(function);
        }

        let body = fold(&function.body);
        trace!(before = %function.body, after = %body, "folded constants");
        Ok(Function {
            params: function.params,
            body,
        })
    }

    /// Compile `source` into a loadable [`Program`].
    #[instrument(level = "debug", skip(self))]
    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        let function = self.compile_ast(source)?;
        let ops = assemble(&function.body);

        debug!(
            arity = function.arity(),
            instructions = ops.len(),
            "compiled function"
        );

        Ok(Program::new(ops, function.arity()))
    }
}

/// Code generation: post-order walk emitting a flat instruction list.
///
/// Calling convention: every subtree leaves its value in r0. For a binary
/// node the left value is spilled with `PU`, the right value is computed into
/// r0, `SW` moves it to r1, `PO` brings the left value back into r0 and the
/// arithmetic op computes `r0 := r0 op r1`.
pub fn assemble(node: &Node) -> Vec<Op> {
    let mut ops = Vec::with_capacity(6 * node.binary_count() + node.leaf_count());
    assemble_into(node, &mut ops);
    ops
}

fn assemble_into(node: &Node, ops: &mut Vec<Op>) {
    match node {
        Node::Immediate(v) => ops.push(Op::Imm(*v)),
        Node::Argument(i) => ops.push(Op::LoadArg(*i)),
        Node::Binary { op, left, right } => {
            assemble_into(left, ops);
            ops.push(Op::Push);
            assemble_into(right, ops);
            ops.push(Op::Swap);
            ops.push(Op::Pop);
            ops.push(Op::arith(*op));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frontend::ParseErrorKind, lang::BinOp};

    fn compile(source: &str) -> Program {
        Compiler::new().compile(source).expect("compile should succeed")
    }

    fn compile_unfolded(source: &str) -> Program {
        Compiler::with_config(CompilerConfig {
            fold_constants: false,
            ..CompilerConfig::default()
        })
        .compile(source)
        .expect("compile should succeed")
    }

    #[test]
    fn test_leaf_emits_one_op() {
        assert_eq!(assemble(&Node::Immediate(3.0)), vec![Op::Imm(3.0)]);
        assert_eq!(assemble(&Node::Argument(4)), vec![Op::LoadArg(4)]);
    }

    #[test]
    fn test_binary_calling_convention() {
        let node = Node::binary(BinOp::Sub, Node::Immediate(5.0), Node::Argument(0));
        assert_eq!(
            assemble(&node),
            vec![
                Op::Imm(5.0),
                Op::Push,
                Op::LoadArg(0),
                Op::Swap,
                Op::Pop,
                Op::Sub,
            ]
        );
    }

    #[test]
    fn test_pure_constant_is_single_imm() {
        let program = compile("[] 1+1");
        assert_eq!(program.ops, vec![Op::Imm(2.0)]);
        assert_eq!(program.arity, 0);
    }

    #[test]
    fn test_instruction_count_law() {
        // x + 2*3 unfolded: 2 binary nodes, 3 leaves
        let program = compile_unfolded("[x] x+2*3");
        assert_eq!(program.len(), 6 * 2 + 3);

        // folded to x + 6: 1 binary node, 2 leaves
        let program = compile("[x] x+2*3");
        assert_eq!(program.len(), 6 + 2);
    }

    #[test]
    fn test_count_law_matches_tree_shape() {
        for source in ["[a b] a*b-(a+b)/2", "[x] ((x))", "[p q r] p-q-r*p/q"] {
            let f = Compiler::new().compile_ast(source).unwrap();
            let ops = assemble(&f.body);
            assert_eq!(
                ops.len(),
                6 * f.body.binary_count() + f.body.leaf_count(),
                "count law failed for {}",
                source
            );
        }
    }

    #[test]
    fn test_nested_right_operand() {
        // a - (b * c)
        let program = compile("[a b c] a-b*c");
        assert_eq!(
            program.ops,
            vec![
                Op::LoadArg(0),
                Op::Push,
                Op::LoadArg(1),
                Op::Push,
                Op::LoadArg(2),
                Op::Swap,
                Op::Pop,
                Op::Mul,
                Op::Swap,
                Op::Pop,
                Op::Sub,
            ]
        );
    }

    #[test]
    fn test_arity_recorded() {
        assert_eq!(compile("[a b c] a").arity, 3);
    }

    #[test]
    fn test_folding_disabled_keeps_tree() {
        let f = Compiler::with_config(CompilerConfig {
            fold_constants: false,
            ..CompilerConfig::default()
        })
        .compile_ast("[] 1+1")
        .unwrap();
        assert_eq!(f.body.binary_count(), 1);
    }

    #[test]
    fn test_unknown_variable_error() {
        let err = Compiler::new().compile("[x y] x + z").unwrap_err();
        match &err {
            CompileError::UnknownVariable { name, col, hint } => {
                assert_eq!(name, "z");
                assert_eq!(*col, 11);
                assert_eq!(hint.as_deref(), Some("declared parameters are: x, y"));
            }
            other => panic!("expected unknown variable, got {:?}", other),
        }
        assert!(err.to_string().starts_with("compile error: 11: unknown variable 'z'"));
    }

    #[test]
    fn test_syntax_error() {
        let err = Compiler::new().compile("[x] x +").unwrap_err();
        assert!(matches!(err, CompileError::Syntax(_)));
        assert!(err.to_string().contains("found end of input"));
    }

    #[test]
    fn test_lexer_error_is_syntax() {
        let err = Compiler::new().compile("[x] x # 1").unwrap_err();
        match err {
            CompileError::Syntax(e) => assert_eq!(e.kind, ParseErrorKind::Lex),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    fn assert_too_deep(err: CompileError, limit: usize) {
        match err {
            CompileError::Syntax(e) => assert_eq!(e.kind, ParseErrorKind::TooDeep { limit }),
            other => panic!("expected depth error, got {:?}", other),
        }
    }

    #[test]
    fn test_deeply_nested_source_is_rejected() {
        let source = format!("[x] {}x{}", "(".repeat(5000), ")".repeat(5000));
        assert_too_deep(Compiler::new().compile(&source).unwrap_err(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_long_chain_is_rejected() {
        let source = format!("[x] x{}", "+x".repeat(50_000));
        assert_too_deep(Compiler::new().compile(&source).unwrap_err(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_max_depth_from_config() {
        let compiler = Compiler::with_config(CompilerConfig {
            max_depth: 4,
            ..CompilerConfig::default()
        });
        assert!(compiler.compile("[x] x+x+x+x").is_ok());
        assert_too_deep(compiler.compile("[x] x+x+x+x+x").unwrap_err(), 4);
        assert_too_deep(compiler.compile("[x] (((((x)))))").unwrap_err(), 4);
    }
}
