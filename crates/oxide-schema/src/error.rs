//! Error types for the schema workflow.

use std::path::PathBuf;

use oxide_schema_core::parser::StrictParseError;
use oxide_schema_core::validate::ValidationIssue;

/// Errors that can occur while planning or writing a migration.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// IO error reading the schema, the migrations or an input file.
    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file does not exist.
    #[error("Schema file not found: {}", .0.display())]
    SchemaNotFound(PathBuf),

    /// Migration file already exists.
    #[error("Migration file already exists: {}", .0.display())]
    MigrationExists(PathBuf),

    /// An output file exists and overwriting was not requested.
    #[error("File already exists: {}", .0.display())]
    FileExists(PathBuf),

    /// The migration name has no usable characters.
    #[error("Invalid migration name: {0:?}")]
    InvalidName(String),

    /// Strict mode rejected skipped constructs.
    #[error("Failed to parse '{source_name}': {error}")]
    Parse {
        /// Schema file or migrations directory.
        source_name: String,
        /// The promoted diagnostics.
        #[source]
        error: StrictParseError,
    },

    /// The schema file parsed but is structurally invalid.
    #[error("Schema is invalid:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<ValidationIssue>),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for schema workflow operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
