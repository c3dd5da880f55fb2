use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dbrun", about = "Run directive-annotated SQL batches and render text reports")]
pub struct Cli {
    /// Path to the profile file
    #[arg(short = 'c', long, global = true, env = "DBRUN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit diagnostics to stderr
    #[arg(short = 'v', long, global = true, env = "DBRUN_VERBOSE")]
    pub verbose: bool,

    /// Disable credential masking in diagnostics
    #[arg(long, global = true, env = "DBRUN_SHOW_SECRETS")]
    pub show_secrets: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute every query job in the input and print the report
    Run(RunArgs),

    /// Show the parsed query jobs without executing them
    Jobs(InputArgs),

    /// Check that the profile file exists and is valid
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// File holding SQL and directives (reads stdin when omitted or "-")
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Report width in columns (default: terminal width, or 80)
    #[arg(short = 'w', long, env = "DBRUN_WIDTH")]
    pub width: Option<usize>,

    /// Per-statement timeout in seconds
    #[arg(short = 't', long, env = "DBRUN_TIMEOUT")]
    pub timeout: Option<u64>,
}
