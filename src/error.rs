use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unrecognized column layout. Columns found: {}", .columns.join(", "))]
    SchemaUnrecognized { columns: Vec<String> },

    #[error("Both known column layouts are present; an explicit schema choice is required")]
    SchemaAmbiguous,

    #[error("No dataset loaded")]
    NoDataset,

    #[error("The '{view}' analysis requires missing column(s): {}", .columns.join(", "))]
    MissingColumns { view: String, columns: Vec<String> },

    #[error("No {kind} found with identifier '{id}'")]
    EntityNotFound { kind: String, id: String },

    #[error("Empty search input: please enter a {0} identifier")]
    EmptySearchInput(String),

    #[error("Header row {row} is out of range for a sheet of {sheet_rows} rows")]
    HeaderRowOutOfRange { row: usize, sheet_rows: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
