//! Where schemas come from.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use oxide_schema_core::prelude::*;

use crate::error::{Result, SchemaError};

/// A loadable schema.
pub trait SchemaSource {
    /// Name used in logs and error messages.
    fn source_name(&self) -> String;

    /// Loads the schema, keeping whatever diagnostics were produced.
    fn load(&self) -> Result<Parsed<Schema>>;
}

/// A declarative schema file.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    path: PathBuf,
}

impl SchemaFile {
    /// Creates a source for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SchemaSource for SchemaFile {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Parsed<Schema>> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SchemaError::SchemaNotFound(self.path.clone())
            } else {
                SchemaError::io(&self.path, e)
            }
        })?;
        debug!("Parsing {}", self.path.display());
        Ok(parse_schema(&text).with_source(&self.source_name()))
    }
}

/// The schema produced by a directory of goose migrations.
#[derive(Debug, Clone)]
pub struct MigrationsDir {
    path: PathBuf,
}

impl MigrationsDir {
    /// Creates a source for the directory at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists the `.sql` files in name order.
    ///
    /// A missing directory has no migrations.
    pub fn migration_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(SchemaError::io(&self.path, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SchemaError::io(&self.path, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl SchemaSource for MigrationsDir {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Parsed<Schema>> {
        let mut contents = Vec::new();
        for path in self.migration_files()? {
            let text = fs::read_to_string(&path).map_err(|e| SchemaError::io(&path, e))?;
            let name = path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            contents.push((name, text));
        }
        debug!(
            "Replaying {} migration(s) from {}",
            contents.len(),
            self.path.display()
        );
        Ok(replay_migrations(
            contents
                .iter()
                .map(|(name, text)| (name.as_str(), text.as_str())),
        ))
    }
}
