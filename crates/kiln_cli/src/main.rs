//! Kiln CLI: incremental builds for single-project C codebases.
//!
//! `kiln build` compiles what changed and links an executable (or archives a
//! static library with `--lib`), `kiln run` starts the built program,
//! `kiln clean` removes build artifacts and `kiln init` writes a `kiln.toml`
//! template. Running `kiln` without a subcommand performs a sequential build
//! with the default profile.

#![warn(missing_docs)]

mod build;
mod clean;
mod init;
mod project;
mod run;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Kiln, an incremental C build tool.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Incremental C build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `kiln.toml` configuration file or project directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run. Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile changed sources and link or archive the project.
    Build(BuildArgs),
    /// Run the built executable.
    Run,
    /// Remove object files and build outputs.
    Clean,
    /// Write a `kiln.toml` template into the current directory.
    Init,
}

/// Arguments for the `kiln build` subcommand.
#[derive(Parser, Debug, Default)]
pub struct BuildArgs {
    /// Flag profile from `kiln.toml` (default: the first profile).
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Compile units in parallel. Warnings are silenced.
    #[arg(short, long)]
    pub fast: bool,

    /// Produce a static library and publish headers instead of an executable.
    #[arg(short, long)]
    pub lib: bool,

    /// Number of parallel workers (implies `--fast`).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format for the build report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Build report output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        None => build::run(&BuildArgs::default(), &global),
        Some(Command::Build(ref args)) => build::run(args, &global),
        Some(Command::Run) => run::run(&global),
        Some(Command::Clean) => clean::run(&global),
        Some(Command::Init) => init::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
