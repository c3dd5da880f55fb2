use crate::error::DbrunError;
use crate::masking;
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the profile used by jobs without a `db` override.
pub const DEFAULT_PROFILE: &str = "default";

const CONFIG_FILE_NAME: &str = "profiles.json";

const SUPPORTED_CLIENTS: &str = "mssql, mysql, pg, sqlite3, mysql2 or oracledb";

/// Database engines a profile can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    MsSql,
    MySql,
    MySql2,
    Pg,
    Sqlite3,
    OracleDb,
}

impl ClientKind {
    pub fn name(self) -> &'static str {
        match self {
            ClientKind::MsSql => "mssql",
            ClientKind::MySql => "mysql",
            ClientKind::MySql2 => "mysql2",
            ClientKind::Pg => "pg",
            ClientKind::Sqlite3 => "sqlite3",
            ClientKind::OracleDb => "oracledb",
        }
    }
}

impl FromStr for ClientKind {
    type Err = DbrunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mssql" => Ok(ClientKind::MsSql),
            "mysql" => Ok(ClientKind::MySql),
            "mysql2" => Ok(ClientKind::MySql2),
            "pg" => Ok(ClientKind::Pg),
            "sqlite3" => Ok(ClientKind::Sqlite3),
            "oracledb" => Ok(ClientKind::OracleDb),
            other => Err(DbrunError::ConfigInvalid {
                message: format!("unknown client '{}' (expected {})", other, SUPPORTED_CLIENTS),
            }),
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection parameters shared by every engine.
#[derive(Debug)]
pub struct ConnectionParams {
    pub host: String,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    pub port: Option<u16>,
    /// ODBC driver name; `None` picks the usual driver for the client.
    pub driver: Option<String>,
    /// Always on: a job is sent to the engine as one multi-statement batch.
    pub multiple_statements: bool,
}

/// A validated, named data-source configuration.
#[derive(Debug)]
pub struct DataSourceProfile {
    pub client: ClientKind,
    pub connection: ConnectionParams,
}

impl DataSourceProfile {
    /// One-line connection target for diagnostics, password masked unless `show_secrets`.
    pub fn describe(&self, show_secrets: bool) -> String {
        let c = &self.connection;
        let port = c.port.map(|p| format!(":{}", p)).unwrap_or_default();
        format!(
            "{}://{}:{}@{}{}/{}",
            self.client,
            c.user,
            masking::format_secret(&c.password, show_secrets),
            c.host,
            port,
            c.database
        )
    }
}

/// Immutable name -> profile mapping. Always holds a `default` profile.
#[derive(Debug)]
pub struct ProfileTable {
    default: DataSourceProfile,
    named: BTreeMap<String, DataSourceProfile>,
}

impl ProfileTable {
    pub fn from_json(content: &str) -> Result<Self, DbrunError> {
        let raw: HashMap<String, RawProfile> =
            serde_json::from_str(content).map_err(|e| DbrunError::ConfigInvalid {
                message: format!("cannot parse profile table: {}", e),
            })?;
        Self::from_raw(raw)
    }

    pub fn from_toml(content: &str) -> Result<Self, DbrunError> {
        let raw: HashMap<String, RawProfile> =
            toml::from_str(content).map_err(|e| DbrunError::ConfigInvalid {
                message: format!("cannot parse profile table: {}", e),
            })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: HashMap<String, RawProfile>) -> Result<Self, DbrunError> {
        let mut default = None;
        let mut named = BTreeMap::new();

        for (name, profile) in raw {
            let profile = validate_profile(&name, profile)?;
            if name == DEFAULT_PROFILE {
                default = Some(profile);
            } else {
                named.insert(name, profile);
            }
        }

        let default = default.ok_or_else(|| DbrunError::ConfigInvalid {
            message: format!("no '{}' profile defined", DEFAULT_PROFILE),
        })?;

        Ok(ProfileTable { default, named })
    }

    pub fn default_profile(&self) -> &DataSourceProfile {
        &self.default
    }

    pub fn get(&self, name: &str) -> Option<&DataSourceProfile> {
        if name == DEFAULT_PROFILE {
            Some(self.default_profile())
        } else {
            self.named.get(name)
        }
    }

    /// Look up a profile by name, falling back to `default` for unknown names.
    /// Returns the name that was actually used.
    pub fn resolve(&self, name: Option<&str>) -> (&str, &DataSourceProfile) {
        match name.and_then(|n| self.named.get_key_value(n)) {
            Some((name, profile)) => (name.as_str(), profile),
            None => (DEFAULT_PROFILE, self.default_profile()),
        }
    }

    /// Profile names, `default` first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(DEFAULT_PROFILE).chain(self.named.keys().map(String::as_str))
    }
}

// --- profile file structs ---

#[derive(Debug, Deserialize)]
struct RawProfile {
    client: Option<String>,
    connection: Option<RawConnection>,
}

#[derive(Debug, Deserialize, Default)]
struct RawConnection {
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    password_env: Option<String>,
    database: Option<String>,
    port: Option<u16>,
    driver: Option<String>,
}

fn validate_profile(name: &str, raw: RawProfile) -> Result<DataSourceProfile, DbrunError> {
    let client_name = raw
        .client
        .as_deref()
        .ok_or_else(|| invalid(name, "missing client"))?;
    let client = client_name.parse::<ClientKind>().map_err(|_| {
        invalid(
            name,
            &format!("unknown client '{}' (expected {})", client_name, SUPPORTED_CLIENTS),
        )
    })?;

    let conn = raw
        .connection
        .ok_or_else(|| invalid(name, "missing connection"))?;

    let host = non_empty(conn.host).ok_or_else(|| invalid(name, "missing connection.host"))?;
    let user = non_empty(conn.user).ok_or_else(|| invalid(name, "missing connection.user"))?;
    let database =
        non_empty(conn.database).ok_or_else(|| invalid(name, "missing connection.database"))?;
    let password = resolve_secret(conn.password.as_deref(), conn.password_env.as_deref())
        .ok_or_else(|| invalid(name, "missing connection.password"))?;

    Ok(DataSourceProfile {
        client,
        connection: ConnectionParams {
            host,
            user,
            password,
            database,
            port: conn.port,
            driver: non_empty(conn.driver),
            multiple_statements: true,
        },
    })
}

fn invalid(profile: &str, detail: &str) -> DbrunError {
    DbrunError::ConfigInvalid {
        message: format!("profile '{}': {}", profile, detail),
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve a password from a direct value or env indirection (`password_env`).
fn resolve_secret(direct: Option<&str>, env_key: Option<&str>) -> Option<SecretString> {
    if let Some(val) = direct
        && !val.is_empty()
    {
        return Some(SecretString::from(val.to_string()));
    }
    if let Some(key) = env_key
        && let Ok(val) = std::env::var(key)
        && !val.is_empty()
    {
        return Some(SecretString::from(val));
    }
    None
}

/// Resolve the profile file path: --config flag > DBRUN_CONFIG > platform default.
pub fn resolve_config_path(cli_config: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_config {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("DBRUN_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "dbrun")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Load the profile table at `path`.
///
/// A missing file is `ConfigMissing`; anything unreadable, unparsable or
/// structurally incomplete is `ConfigInvalid`. `.toml` files are read as TOML,
/// everything else as JSON.
pub fn load_profile_table(path: &Path) -> Result<ProfileTable, DbrunError> {
    if !path.exists() {
        return Err(DbrunError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| DbrunError::ConfigInvalid {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        ProfileTable::from_toml(&content)
    } else {
        ProfileTable::from_json(&content)
    }
}
