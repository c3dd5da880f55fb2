use clap::Parser;
use dbrun::backend::odbc::OdbcBackend;
use dbrun::cli::{self, Cli, Command};
use dbrun::error::DbrunError;
use dbrun::verbose::Verbosity;
use dbrun::{config, directive, output, report};
use std::path::Path;
use std::process;

const FALLBACK_WIDTH: usize = 80;

#[tokio::main]
async fn main() {
    // Load .env file (optional, ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let verbosity = Verbosity::new(cli.verbose, cli.show_secrets);

    let result = match cli.command {
        Command::Run(ref args) => run(args, cli.config.as_deref(), &verbosity).await,
        Command::Jobs(ref args) => list_jobs(args, cli.config.as_deref(), &verbosity),
        Command::CheckConfig => check_config(cli.config.as_deref(), &verbosity),
    };

    if let Err(err) = result {
        output::print_error(&err);
        process::exit(1);
    }
}

async fn run(
    args: &cli::RunArgs,
    config_path: Option<&Path>,
    verbosity: &Verbosity,
) -> Result<(), DbrunError> {
    let input = read_input(&args.input)?;
    let width = resolve_width(args.width);

    let path = config::resolve_config_path(config_path);
    verbosity.emit(&format!("loading profiles from {}...", path.display()));
    // Batch-level config errors become the report itself, not a CLI error.
    let profiles = config::load_profile_table(&path);

    verbosity.emit(&format!("rendering at width {}", width));
    let backend = OdbcBackend::new(args.timeout, *verbosity);
    let lines = report::generate_report(&input, width, &profiles, &backend, verbosity).await;
    output::print_report(&lines);

    Ok(())
}

fn list_jobs(
    args: &cli::InputArgs,
    config_path: Option<&Path>,
    verbosity: &Verbosity,
) -> Result<(), DbrunError> {
    let input = read_input(args)?;
    let path = config::resolve_config_path(config_path);
    verbosity.emit(&format!("loading profiles from {}...", path.display()));
    let profiles = config::load_profile_table(&path)?;

    let jobs = directive::parse(&input, &profiles);
    let mut lines = Vec::new();
    for (i, job) in jobs.iter().enumerate() {
        lines.push(format!(
            "--- job {} (profile: {}, output: {}, title: {})",
            i + 1,
            job.settings.profile_name,
            job.settings.format.label(),
            job.settings.title
        ));
        lines.extend(output::text_lines(&job.sql));
        lines.push(String::new());
    }
    output::print_report(&lines);

    Ok(())
}

fn check_config(config_path: Option<&Path>, verbosity: &Verbosity) -> Result<(), DbrunError> {
    let path = config::resolve_config_path(config_path);
    let profiles = match config::load_profile_table(&path) {
        Ok(profiles) => profiles,
        Err(err) => {
            output::print_report(&report::error_report(&err));
            return Err(err);
        }
    };

    let mut lines = vec![format!("profile file: {}", path.display())];
    for name in profiles.names() {
        if let Some(profile) = profiles.get(name) {
            lines.push(format!("  {}: {}", name, profile.describe(verbosity.show_secrets)));
        }
    }
    output::print_report(&lines);

    Ok(())
}

// --- Helpers ---

fn read_input(args: &cli::InputArgs) -> Result<String, DbrunError> {
    match args.file.as_deref() {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).map_err(|e| DbrunError::Config {
                message: format!("cannot read input file {}: {}", path.display(), e),
            })
        }
        _ => Ok(std::io::read_to_string(std::io::stdin())?),
    }
}

fn resolve_width(cli_width: Option<usize>) -> usize {
    cli_width
        .or_else(|| {
            terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize)
        })
        .unwrap_or(FALLBACK_WIDTH)
}
