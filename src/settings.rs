use serde_json::{Map, Value};

use crate::config::{DataSourceProfile, ProfileTable};

/// Title used when a directive does not set one.
pub const DEFAULT_TITLE: &str = "QUERY RESULT";

/// Rendering strategy selected by a directive's `output` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Markdown,
    Csv,
    Json,
}

impl OutputFormat {
    /// Map a directive `output` name to a format. Unknown names fall back to `Table`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "table" | "visualize" => OutputFormat::Table,
            "markdown" | "md" => OutputFormat::Markdown,
            "csv" => OutputFormat::Csv,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Fully resolved execution settings for one job.
#[derive(Debug, Clone)]
pub struct Settings<'a> {
    pub format: OutputFormat,
    pub profile_name: &'a str,
    pub profile: &'a DataSourceProfile,
    pub title: String,
}

impl<'a> Settings<'a> {
    pub fn defaults(profiles: &'a ProfileTable) -> Self {
        let (profile_name, profile) = profiles.resolve(None);
        Settings {
            format: OutputFormat::Table,
            profile_name,
            profile,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Resolve the settings for a directive body.
///
/// Never fails: an absent, empty or unparsable body yields the defaults, and
/// unknown profile or format names fall back to `default` / `Table`. Keys are
/// read independently, so a non-string value only discards its own key.
pub fn resolve<'a>(body: Option<&str>, profiles: &'a ProfileTable) -> Settings<'a> {
    let mut settings = Settings::defaults(profiles);

    let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) else {
        return settings;
    };

    let Ok(directive) = serde_json::from_str::<Map<String, Value>>(body) else {
        return settings;
    };
    let text = |key: &str| directive.get(key).and_then(Value::as_str);

    if let Some(db) = text("db") {
        let (profile_name, profile) = profiles.resolve(Some(db));
        settings.profile_name = profile_name;
        settings.profile = profile;
    }
    if let Some(output) = text("output") {
        settings.format = OutputFormat::from_name(output);
    }
    if let Some(title) = text("title").filter(|t| !t.is_empty()) {
        settings.title = title.to_string();
    }

    settings
}
