use crate::backend::{Backend, ResultRow};
use crate::config::{ClientKind, DataSourceProfile};
use crate::error::DbrunError;
use crate::masking;
use crate::verbose::Verbosity;
use odbc_api::buffers::TextRowSet;
use odbc_api::{ConnectionOptions, Cursor, Environment};
use secrecy::ExposeSecret;
use serde_json::Value;

const BATCH_SIZE: usize = 5000;
const MAX_STR_LEN: usize = 4096;

/// Executes jobs through the platform ODBC driver manager.
pub struct OdbcBackend {
    timeout_secs: Option<u64>,
    verbosity: Verbosity,
}

impl OdbcBackend {
    pub fn new(timeout_secs: Option<u64>, verbosity: Verbosity) -> Self {
        Self {
            timeout_secs,
            verbosity,
        }
    }
}

fn default_driver(client: ClientKind) -> &'static str {
    match client {
        ClientKind::MsSql => "ODBC Driver 18 for SQL Server",
        ClientKind::MySql | ClientKind::MySql2 => "MySQL ODBC 8.0 Unicode Driver",
        ClientKind::Pg => "PostgreSQL Unicode",
        ClientKind::Sqlite3 => "SQLite3 ODBC Driver",
        ClientKind::OracleDb => "Oracle ODBC Driver",
    }
}

/// Build the ODBC connection string for a profile.
pub fn connection_string(profile: &DataSourceProfile) -> String {
    let c = &profile.connection;
    let driver = c
        .driver
        .as_deref()
        .unwrap_or_else(|| default_driver(profile.client));
    let mut parts = vec![format!("Driver={{{}}}", driver)];

    match profile.client {
        ClientKind::MsSql => {
            let server = match c.port {
                Some(port) => format!("{},{}", c.host, port),
                None => c.host.clone(),
            };
            parts.push(format!("Server={}", server));
            parts.push(format!("Database={}", c.database));
        }
        ClientKind::MySql | ClientKind::MySql2 | ClientKind::Pg => {
            parts.push(format!("Server={}", c.host));
            if let Some(port) = c.port {
                parts.push(format!("Port={}", port));
            }
            parts.push(format!("Database={}", c.database));
        }
        ClientKind::Sqlite3 => {
            parts.push(format!("Database={}", c.database));
        }
        ClientKind::OracleDb => {
            let port = c.port.unwrap_or(1521);
            parts.push(format!("DBQ={}:{}/{}", c.host, port, c.database));
        }
    }

    parts.push(format!("UID={}", c.user));
    parts.push(format!(
        "PWD={}",
        odbc_api::escape_attribute_value(c.password.expose_secret())
    ));

    if c.multiple_statements && matches!(profile.client, ClientKind::MySql | ClientKind::MySql2) {
        parts.push("MULTI_STATEMENTS=1".to_string());
    }

    parts.join(";") + ";"
}

/// Statement text sent to the driver for a job.
///
/// SQL Server answers each DML statement with a columnless row count, which
/// would end the batch before any later SELECT is reached.
pub fn batch_sql(client: ClientKind, sql: &str) -> String {
    match client {
        ClientKind::MsSql => format!("SET NOCOUNT ON;\n{}", sql),
        _ => sql.to_string(),
    }
}

impl Backend for OdbcBackend {
    async fn execute(
        &self,
        sql: &str,
        profile: &DataSourceProfile,
    ) -> Result<Vec<ResultRow>, DbrunError> {
        let conn_str = connection_string(profile);
        self.verbosity.emit(&format!(
            "connecting with {}",
            masking::mask_connection_string(&conn_str, self.verbosity.show_secrets)
        ));
        let timeout_secs = self.timeout_secs;

        // odbc-api Environment and connection are not Send, so we run in spawn_blocking
        let sql = batch_sql(profile.client, sql);
        tokio::task::spawn_blocking(move || fetch_all(&conn_str, &sql, timeout_secs))
            .await
            .map_err(|e| DbrunError::Query {
                message: format!("task join error: {}", e),
            })?
    }
}

fn fetch_all(
    conn_str: &str,
    sql: &str,
    timeout_secs: Option<u64>,
) -> Result<Vec<ResultRow>, DbrunError> {
    let env = Environment::new().map_err(|e| DbrunError::Connection {
        message: format!("ODBC environment error: {}", e),
    })?;

    let conn = env
        .connect_with_connection_string(
            conn_str,
            ConnectionOptions {
                login_timeout_sec: Some(30),
                ..Default::default()
            },
        )
        .map_err(|e| DbrunError::Connection {
            message: format!("connection failed: {}", e),
        })?;

    let mut rows = Vec::new();
    let mut next = conn
        .execute(sql, (), timeout_secs.map(|s| s as usize))
        .map_err(|e| query_error(e, timeout_secs))?;

    // Multi-statement batches yield one result set per statement.
    while let Some(cursor) = next {
        let cursor = read_result_set(cursor, &mut rows)?;
        next = cursor
            .more_results()
            .map_err(|e| query_error(e, timeout_secs))?;
    }

    Ok(rows)
}

fn read_result_set<C: Cursor>(mut cursor: C, rows: &mut Vec<ResultRow>) -> Result<C, DbrunError> {
    let num_cols = cursor.num_result_cols().map_err(|e| DbrunError::Query {
        message: format!("failed to get column count: {}", e),
    })?;
    if num_cols == 0 {
        return Ok(cursor);
    }

    let names = cursor
        .column_names()
        .map_err(|e| DbrunError::Query {
            message: format!("failed to read column names: {}", e),
        })?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| DbrunError::Query {
            message: format!("failed to decode column name: {}", e),
        })?;

    let buffer = TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_STR_LEN)).map_err(
        |e| DbrunError::Query {
            message: format!("failed to create buffer: {}", e),
        },
    )?;

    let mut block = cursor.bind_buffer(buffer).map_err(|e| DbrunError::Query {
        message: format!("failed to bind buffer: {}", e),
    })?;

    while let Some(batch) = block.fetch().map_err(|e| DbrunError::Query {
        message: format!("fetch error: {}", e),
    })? {
        for row_idx in 0..batch.num_rows() {
            let mut row = ResultRow::new();
            for (col_idx, name) in names.iter().enumerate() {
                let value = match batch.at(col_idx, row_idx) {
                    Some(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
                    None => Value::Null,
                };
                row.insert(name.clone(), value);
            }
            rows.push(row);
        }
    }

    block
        .unbind()
        .map(|(cursor, _buffer)| cursor)
        .map_err(|e| DbrunError::Query {
            message: format!("failed to release buffer: {}", e),
        })
}

fn query_error(e: odbc_api::Error, timeout_secs: Option<u64>) -> DbrunError {
    let message = e.to_string();
    match timeout_secs {
        // SQLSTATE HYT00: statement timeout expired
        Some(seconds) if message.contains("HYT00") => DbrunError::Timeout { seconds },
        _ => DbrunError::Query { message },
    }
}
