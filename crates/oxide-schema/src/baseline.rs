//! Adopting an existing database.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use oxide_schema_core::prelude::*;

use crate::error::{Result, SchemaError};
use crate::writer::{MigrationWriter, write_atomic};

/// Table descriptions exported as JSON.
///
/// The file holds an array of [`IntrospectedTable`] objects.
#[derive(Debug, Clone)]
pub struct JsonIntrospection {
    path: PathBuf,
}

impl JsonIntrospection {
    /// Reads tables from the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Introspect for JsonIntrospection {
    type Error = SchemaError;

    fn introspect(&self) -> Result<Vec<IntrospectedTable>> {
        let text = fs::read_to_string(&self.path).map_err(|e| SchemaError::io(&self.path, e))?;
        let tables: Vec<IntrospectedTable> = serde_json::from_str(&text)?;
        debug!("Read {} table(s) from {}", tables.len(), self.path.display());
        Ok(tables)
    }
}

/// Schema file and migration describing an existing database.
#[derive(Debug, Clone)]
pub struct Baseline {
    /// Rendered schema file.
    pub schema_file: String,
    /// Idempotent goose migration.
    pub migration: String,
    /// Whether the rendered schema parses back to the introspected one.
    pub round_trips: bool,
}

impl Baseline {
    /// Writes the migration through `writer`, then the schema file to
    /// `schema_path`.
    ///
    /// The migration is removed again if the schema file cannot be
    /// written, so a failure leaves neither behind.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::FileExists`] if `schema_path` exists and
    /// `overwrite` is unset, or any error of writing the migration.
    pub fn write(
        &self,
        writer: &MigrationWriter,
        schema_path: &Path,
        overwrite: bool,
    ) -> Result<PathBuf> {
        if !overwrite && schema_path.exists() {
            return Err(SchemaError::FileExists(schema_path.to_path_buf()));
        }

        let migration = writer.write("baseline_from_database", &self.migration)?;
        if let Err(e) = write_atomic(schema_path, &self.schema_file, overwrite) {
            if let Err(cleanup) = fs::remove_file(&migration) {
                warn!("Failed to remove {}: {cleanup}", migration.display());
            }
            return Err(if e.kind() == ErrorKind::AlreadyExists {
                SchemaError::FileExists(schema_path.to_path_buf())
            } else {
                SchemaError::io(schema_path, e)
            });
        }
        Ok(migration)
    }
}

/// Builds the baseline for whatever `source` describes.
///
/// # Errors
///
/// Returns the source's error if introspection fails.
pub fn baseline<I: Introspect>(source: &I) -> std::result::Result<Baseline, I::Error> {
    let tables = source.introspect()?;
    let schema_file = render_schema_file(&tables);
    let reparsed = parse_schema(&schema_file);
    let round_trips =
        reparsed.is_clean() && diff_schemas(&reparsed.value, &introspected_schema(&tables)).is_empty();

    Ok(Baseline {
        migration: baseline_migration(&tables),
        schema_file,
        round_trips,
    })
}
