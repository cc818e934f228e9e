use thiserror::Error;

/// Errors raised by the collaborators around the core: loading lookup
/// tables and pattern workbooks, exporting rows and persisting snapshots.
///
/// The processing core itself never fails; unresolved or malformed input
/// degrades to flagged rows instead.
#[derive(Debug, Error)]
pub enum WhipError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("failed to read workbook: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    #[cfg(feature = "xlsx")]
    #[error("failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot codec error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported input: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, WhipError>;
