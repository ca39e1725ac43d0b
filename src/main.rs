use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::warn;

use drift_interp::{ReportSink, SeparationAnalysis, SeparationReport};
use drift_ir::{LoopMap, Program};
use drift_parse::parse_program;

/// Track how far two variables drift apart along a bounded exploration of a
/// procedure's control flow.
#[derive(Debug, Parser)]
#[command(name = "drift", version)]
struct Cli {
    /// Program file to analyze.
    program: PathBuf,
    /// First tracked variable.
    variable_a: String,
    /// Second tracked variable.
    variable_b: String,
    /// Maximum traversal recursion depth.
    #[arg(long, default_value_t = drift_interp::DEFAULT_DEPTH_LIMIT)]
    max_depth: usize,
    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Prints every measurement to stdout in the report line format; logs stay
/// on stderr.
struct TextReport;

impl ReportSink for TextReport {
    fn enter_block(&mut self, label: &str) {
        println!("Label Name: {label}");
    }

    fn after_instruction(&mut self, report: &SeparationReport) {
        println!("{report}");
    }

    fn after_block(&mut self, _label: &str, report: &SeparationReport) {
        println!("{report}");
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );
}

fn load(path: &Path) -> anyhow::Result<Program> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let program = parse_program(&source)
        .with_context(|| format!("failed to load '{}'", path.display()))?;
    Ok(program)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let program = match load(&cli.program) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let Some(proc) = program.find("main") else {
        warn!("program has no 'main' procedure; nothing to analyze");
        return ExitCode::SUCCESS;
    };

    let loops = LoopMap::analyze(proc);
    for issue in loops.issues() {
        warn!("{issue}");
    }

    let mut analysis = SeparationAnalysis::new(proc, &loops, &cli.variable_a, &cli.variable_b)
        .with_max_depth(cli.max_depth);
    match analysis.run(&mut TextReport) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
