use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to read input path: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No input files match pattern: {0}")]
    NoInputFiles(String),

    #[error("Record {0} has no valuation and cannot be written")]
    MissingValuation(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
