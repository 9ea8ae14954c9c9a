use std::io;

use thiserror::Error;

use crate::options::ColumnType;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to load conversion profile: {0}")]
    ProfileLoad(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("table extraction failed on page {page}: {message}")]
    ExternalTool { page: u32, message: String },
}

/// A single cell failed to parse as its declared column type. Recovered at
/// record level: the owning record is dropped and processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {raw:?} as {column_type}")]
pub struct ParseError {
    pub column_type: ColumnType,
    pub raw: String,
}
