use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use regcalc::bytecode::disasm::{disassemble, listing};
use regcalc::bytecode::stack_check_error::check_program;
use regcalc::{Compiler, CompilerConfig, Program, Vm};

#[derive(Parser, Debug)]
#[command(name = "regcalc")]
#[command(about = "Compile arithmetic functions like `[x y] x*y` and evaluate them")]
struct Args {
    /// Skip constant folding
    #[arg(long = "no-fold")]
    no_fold: bool,

    /// Print the expression tree of every compiled function
    #[arg(long)]
    ast: bool,

    /// Print a numbered disassembly of every compiled function
    #[arg(long)]
    disasm: bool,

    /// Start with a program saved by `:save`
    #[arg(long = "load")]
    load: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("regcalc=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let compiler = Compiler::with_config(CompilerConfig {
        fold_constants: !args.no_fold,
        ..CompilerConfig::default()
    });
    let mut repl = Repl::new(compiler, args.ast, args.disasm);

    if let Some(path) = &args.load {
        match read_program(path) {
            Ok(program) => repl.vm.load(program),
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = repl.run(io::stdin().lock(), &mut io::stdout()) {
        error!("i/o error: {}", e);
        process::exit(1);
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

struct Repl {
    compiler: Compiler,
    vm: Vm,
    show_ast: bool,
    show_disasm: bool,
}

impl Repl {
    fn new(compiler: Compiler, show_ast: bool, show_disasm: bool) -> Self {
        Self {
            compiler,
            vm: Vm::new(),
            show_ast,
            show_disasm,
        }
    }

    fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            write!(out, "regcalc> ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                return Ok(());
            };

            if self.handle(&line?, out)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn handle(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        let line = line.trim();

        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        if line.starts_with('[') {
            self.define(line, out)?;
            return Ok(Flow::Continue);
        }

        if let Some(command) = line.strip_prefix(':') {
            return self.command(command, out);
        }

        self.evaluate(line, out)?;
        Ok(Flow::Continue)
    }

    fn define(&mut self, source: &str, out: &mut impl Write) -> io::Result<()> {
        if self.show_ast {
            match self.compiler.compile_ast(source) {
                Ok(function) => writeln!(out, "{}", function.body)?,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    return Ok(());
                }
            }
        }

        match self.compiler.compile(source) {
            Ok(program) => {
                writeln!(out, "{}", listing(&program))?;
                if self.show_disasm {
                    write!(out, "{}", disassemble(&program))?;
                }
                self.vm.load(program);
            }
            Err(e) => writeln!(out, "{}", e)?,
        }
        Ok(())
    }

    fn evaluate(&self, line: &str, out: &mut impl Write) -> io::Result<()> {
        if self.vm.program().is_none() {
            writeln!(out, "no function loaded; define one first, e.g. [x] x + 1")?;
            return Ok(());
        }

        let args: Vec<f64> = line
            .split_whitespace()
            .filter_map(parse_argument)
            .collect();
        debug!(?args, "evaluating");

        match self.vm.interpret(&args) {
            Ok(value) => writeln!(out, "{}", value),
            Err(e) => writeln!(out, "{}", e),
        }
    }

    fn command(&mut self, command: &str, out: &mut impl Write) -> io::Result<Flow> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or("");
        let path = parts.next();

        match (name, path) {
            ("q" | "quit", _) => return Ok(Flow::Quit),

            ("disasm", _) => match self.vm.program() {
                Some(program) => write!(out, "{}", disassemble(program))?,
                None => writeln!(out, "no function loaded")?,
            },

            ("save", Some(path)) => match self.vm.program() {
                Some(program) => match write_program(Path::new(path), program) {
                    Ok(()) => writeln!(out, "saved to {}", path)?,
                    Err(e) => writeln!(out, "{}", e)?,
                },
                None => writeln!(out, "no function loaded")?,
            },

            ("load", Some(path)) => match read_program(Path::new(path)) {
                Ok(program) => {
                    writeln!(out, "{}", listing(&program))?;
                    self.vm.load(program);
                }
                Err(e) => writeln!(out, "{}", e)?,
            },

            _ => writeln!(out, "commands: :save FILE, :load FILE, :disasm, :quit")?,
        }
        Ok(Flow::Continue)
    }
}

/// Read one REPL argument: the source number grammar (`12`, `3.5`) with an
/// optional leading `-`. Anything else, `inf` and `1e3` included, is dropped.
fn parse_argument(token: &str) -> Option<f64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !fraction.is_none_or(all_digits) {
        return None;
    }
    token.parse().ok()
}

fn write_program(path: &Path, program: &Program) -> Result<(), String> {
    let bytes = program
        .to_bytes()
        .map_err(|e| format!("cannot encode program: {}", e))?;
    fs::write(path, bytes).map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
    info!(path = %path.display(), "saved program");
    Ok(())
}

/// Read and verify a program written by `:save`.
fn read_program(path: &Path) -> Result<Program, String> {
    let bytes =
        fs::read(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let program = Program::from_bytes(&bytes)
        .map_err(|e| format!("'{}' is not a saved program: {}", path.display(), e))?;
    check_program(&program).map_err(|e| format!("in '{}': {}", path.display(), e))?;
    info!(path = %path.display(), instructions = program.len(), "loaded program");
    Ok(program)
}
