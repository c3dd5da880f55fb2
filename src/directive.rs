//! Splits directive-annotated text into query jobs.
//!
//! A directive is a line whose trimmed content starts with `-->`. The rest of
//! the line configures every job until the next directive:
//!
//! ```text
//! --> { "db": "reporting", "output": "csv", "title": "Monthly totals" }
//! SELECT month, SUM(total) FROM orders GROUP BY month
//! ```

use crate::config::ProfileTable;
use crate::settings::{self, Settings};

/// Marker that opens a directive line.
pub const DIRECTIVE_MARKER: &str = "-->";

/// One unit of SQL plus the settings it runs with.
#[derive(Debug, Clone)]
pub struct QueryJob<'a> {
    pub sql: String,
    pub settings: Settings<'a>,
}

/// Return the directive body if `line` (already trimmed) is a directive.
pub fn directive_body(line: &str) -> Option<&str> {
    line.strip_prefix(DIRECTIVE_MARKER).map(str::trim)
}

struct ParseState<'a> {
    profiles: &'a ProfileTable,
    current_sql: String,
    current_settings: Settings<'a>,
    jobs: Vec<QueryJob<'a>>,
}

impl<'a> ParseState<'a> {
    fn new(profiles: &'a ProfileTable) -> Self {
        ParseState {
            profiles,
            current_sql: String::new(),
            current_settings: settings::resolve(None, profiles),
            jobs: Vec::new(),
        }
    }

    fn advance(mut self, line: &str) -> Self {
        match directive_body(line) {
            Some(body) => {
                self.close_job();
                self.current_settings = settings::resolve(Some(body), self.profiles);
            }
            None => {
                if !self.current_sql.is_empty() {
                    self.current_sql.push('\n');
                }
                self.current_sql.push_str(line);
                self.current_sql = self.current_sql.trim().to_string();
            }
        }
        self
    }

    /// Emit the accumulated SQL as a job; empty accumulators are dropped.
    fn close_job(&mut self) {
        let sql = std::mem::take(&mut self.current_sql);
        if !sql.is_empty() {
            self.jobs.push(QueryJob {
                sql,
                settings: self.current_settings.clone(),
            });
        }
    }

    fn finish(mut self) -> Vec<QueryJob<'a>> {
        self.close_job();
        self.jobs
    }
}

/// Split `text` into ordered query jobs.
///
/// Blank lines are discarded. Each directive starts a fresh job whose
/// settings come from that directive alone; an empty directive resets to
/// the defaults rather than carrying the previous settings forward.
pub fn parse<'a>(text: &str, profiles: &'a ProfileTable) -> Vec<QueryJob<'a>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(ParseState::new(profiles), ParseState::advance)
        .finish()
}
