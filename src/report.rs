//! Report assembly: runs parsed jobs in order and concatenates their output.

use crate::backend::{self, Backend};
use crate::config::ProfileTable;
use crate::directive::{self, QueryJob};
use crate::error::DbrunError;
use crate::output;
use crate::render;
use crate::verbose::{Timer, Verbosity};

/// Documentation pointer closing every batch-level error report.
pub const DOCS_POINTER: &str =
    "for more information, see the \"Profiles\" section of the dbrun README";

/// Blank lines appended after each job's block.
const JOB_PADDING: usize = 2;

/// Three-line report for an error that prevents the whole batch from running.
pub fn error_report(err: &DbrunError) -> Vec<String> {
    let message = match err {
        DbrunError::ConfigMissing { path } => {
            format!("Please create a profile file at {}", path.display())
        }
        DbrunError::ConfigInvalid { message } => {
            format!("The profile file has a bad configuration: {}", message)
        }
        other => other.to_string(),
    };
    vec![message, String::new(), DOCS_POINTER.to_string()]
}

async fn run_job<B: Backend>(
    job: &QueryJob<'_>,
    backend: &B,
    width: usize,
    verbosity: &Verbosity,
) -> Result<Vec<String>, DbrunError> {
    let rows = backend.execute(&job.sql, job.settings.profile).await?;
    let groups = backend::group(rows);
    verbosity.emit(&format!(
        "{} rows in {} result groups",
        groups.iter().map(|g| g.rows.len()).sum::<usize>(),
        groups.len()
    ));
    render::render(job.settings.format, &job.settings.title, &groups, width)
}

/// Execute `jobs` strictly in order and assemble their rendered blocks.
///
/// A failing job contributes its error text in place of a result block;
/// the remaining jobs still run.
pub async fn run<B: Backend>(
    jobs: &[QueryJob<'_>],
    backend: &B,
    width: usize,
    verbosity: &Verbosity,
) -> Vec<String> {
    let mut report = Vec::new();

    for (i, job) in jobs.iter().enumerate() {
        verbosity.emit(&format!(
            "job {}/{}: {} output via '{}' ({})",
            i + 1,
            jobs.len(),
            job.settings.format.label(),
            job.settings.profile_name,
            job.settings.profile.describe(verbosity.show_secrets)
        ));
        let timer = Timer::start();

        let block = match run_job(job, backend, width, verbosity).await {
            Ok(lines) => {
                verbosity.emit(&format!("job {} complete ({}ms)", i + 1, timer.elapsed_ms()));
                lines
            }
            Err(err) => {
                verbosity.emit(&format!("job {} failed ({}ms)", i + 1, timer.elapsed_ms()));
                output::text_lines(&err.to_string())
            }
        };

        report.extend(block);
        report.extend(std::iter::repeat_n(String::new(), JOB_PADDING));
    }

    report
}

/// Engine entry point: parse `input` into jobs, run them and return the report.
///
/// A batch-level configuration error short-circuits to its three-line
/// message before any parsing or execution.
pub async fn generate_report<B: Backend>(
    input: &str,
    width: usize,
    profiles: &Result<ProfileTable, DbrunError>,
    backend: &B,
    verbosity: &Verbosity,
) -> Vec<String> {
    let profiles = match profiles {
        Ok(profiles) => profiles,
        Err(err) => return error_report(err),
    };

    let jobs = directive::parse(input, profiles);
    verbosity.emit(&format!("parsed {} jobs", jobs.len()));
    run(&jobs, backend, width, verbosity).await
}
