use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbrunError {
    #[error("config missing: no profile file at {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("config invalid: {message}")]
    ConfigInvalid { message: String },

    #[error("connection: {message}")]
    Connection { message: String },

    #[error("query: {message}")]
    Query { message: String },

    #[error("timeout: query timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("config: {message}")]
    Config { message: String },

    #[error("format: {message}")]
    Format { message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
