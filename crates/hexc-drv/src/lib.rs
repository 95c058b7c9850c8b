//! Compiler driver: wires the lexer, parser and lowerer together and owns
//! the small bundle of CLI-derived settings and the diagnostic handler for
//! one invocation (a `Config`/`Session` split, the same shape the rest of
//! the crate family uses to separate "what to do" from "the state for
//! doing it").

mod error;

pub use error::DriverError;

use std::io::{Read, Write};
use std::path::PathBuf;

use hexc_par::Parser;
use hexc_sem::Lowerer;
use hexc_util::Handler;
use inkwell::context::Context;
use inkwell::module::Module;

/// Module name baked into every emitted artifact.
pub const MODULE_NAME: &str = "Hexenwerk";

/// Usage text printed for `-h`/`--help`.
pub const USAGE: &str = "usage: hexc [-h|--help] [--emit-bc] [--verbose] < source.hex";

/// What the driver produces and how much it says about it on the way.
#[derive(Debug, Clone)]
pub struct Config {
    /// Emit LLVM bitcode (`out.bc`) instead of textual IR (`out.ll`).
    pub emit_bc: bool,
    /// Echo phase progress to stderr.
    pub verbose: bool,
    /// Directory the output artifact is written into.
    pub out_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self { emit_bc: false, verbose: false, out_dir: PathBuf::from(".") }
    }
}

impl Config {
    /// The path `out.ll`/`out.bc` resolves to under `out_dir`.
    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(if self.emit_bc { "out.bc" } else { "out.ll" })
    }
}

/// How the command line resolved.
pub enum ArgOutcome {
    /// `-h`/`--help` was given: print [`USAGE`] and stop.
    Help,
    Run(Config),
}

/// Parses `hexc`'s command-line arguments (excluding `argv[0]`). Unknown
/// arguments are ignored rather than rejected, since the surface here is
/// deliberately small.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> ArgOutcome {
    let mut config = Config::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return ArgOutcome::Help,
            "--emit-bc" => config.emit_bc = true,
            "--verbose" => config.verbose = true,
            _ => {}
        }
    }
    ArgOutcome::Run(config)
}

/// One compiler invocation: configuration plus the diagnostic handler every
/// phase below writes into instead of printing directly.
pub struct Session {
    pub config: Config,
    pub handler: Handler,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config, handler: Handler::new() }
    }

    /// Runs lex → parse → lower over `source` and writes the resulting
    /// module to the configured output path. Returns the number of
    /// top-level statements lowered; diagnostics (including lowering
    /// failures for individual functions) accumulate in `self.handler`
    /// rather than stopping the run.
    pub fn compile(&mut self, source: &str) -> Result<usize, DriverError> {
        let context = Context::create();
        let mut lowerer = Lowerer::new(&context, MODULE_NAME, &self.handler);
        let mut parser = Parser::new(source, &self.handler);
        let mut lowered = 0;

        if self.config.verbose {
            eprintln!("parsing and lowering...");
        }

        while let Some(stmt) = parser.parse() {
            lowerer.lower_top_level(&stmt);
            lowered += 1;
        }

        if self.config.verbose {
            eprintln!("emitting {}...", self.config.output_path().display());
        }
        self.emit(lowerer.module())?;

        if self.config.verbose {
            eprintln!("{} diagnostic(s)", self.handler.error_count());
        }

        Ok(lowered)
    }

    fn emit(&self, module: &Module<'_>) -> Result<(), DriverError> {
        let path = self.config.output_path();
        if self.config.emit_bc {
            if !module.write_bitcode_to_path(&path) {
                return Err(DriverError::OutputWriteFailed(path));
            }
        } else {
            let ir = module.print_to_string().to_string();
            let mut file = std::fs::File::create(&path)
                .map_err(|source| DriverError::OutputOpenFailed(path.clone(), source))?;
            file.write_all(ir.as_bytes())
                .map_err(|source| DriverError::OutputOpenFailed(path.clone(), source))?;
        }
        Ok(())
    }
}

/// Reads the full source text from stdin.
pub fn read_source_from_stdin() -> Result<String, DriverError> {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source).map_err(DriverError::StdinReadFailed)?;
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_flag_short_circuits_before_any_config_is_built() {
        assert!(matches!(parse_args(["-h".to_string()]), ArgOutcome::Help));
        assert!(matches!(parse_args(["--help".to_string()]), ArgOutcome::Help));
    }

    #[test]
    fn emit_bc_and_verbose_flags_are_recognized() {
        match parse_args(["--emit-bc".to_string(), "--verbose".to_string()]) {
            ArgOutcome::Run(config) => {
                assert!(config.emit_bc);
                assert!(config.verbose);
            }
            ArgOutcome::Help => panic!("expected Run"),
        }
    }

    #[test]
    fn output_path_follows_emit_bc() {
        let mut config = Config::default();
        assert!(config.output_path().ends_with("out.ll"));
        config.emit_bc = true;
        assert!(config.output_path().ends_with("out.bc"));
    }

    #[test]
    fn compiling_a_valid_program_lowers_one_statement_and_emits_textual_ir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.out_dir = dir.path().to_path_buf();
        let mut session = Session::new(config);

        let lowered = session.compile("fn id(x: i32) -> i32 { x };").unwrap();

        assert_eq!(lowered, 1);
        assert!(!session.handler.has_errors());
        let ir = std::fs::read_to_string(session.config.output_path()).unwrap();
        assert!(ir.contains("@id"));
    }

    #[test]
    fn diagnostics_survive_a_failed_function_and_the_run_still_emits() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.out_dir = dir.path().to_path_buf();
        let mut session = Session::new(config);

        let lowered =
            session.compile("fn bad(c: bool) -> i32 { if c { 1 } else { 2. } };").unwrap();

        assert_eq!(lowered, 1);
        assert!(session.handler.has_errors());
        assert!(session.config.output_path().exists());
    }
}
