//! Migration file naming and writing.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, SchemaError};

/// Timestamp layout of migration file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Returns the file name `<timestamp>_<name>.sql`.
///
/// Characters that are not ASCII alphanumeric become `_`.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidName`] if nothing usable is left.
pub fn generate_migration_name(timestamp: NaiveDateTime, name: &str) -> Result<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(format!("{}_{cleaned}.sql", timestamp.format(TIMESTAMP_FORMAT)))
}

/// Writes migration files into a directory.
#[derive(Debug, Clone)]
pub struct MigrationWriter {
    dir: PathBuf,
    timestamp: Option<NaiveDateTime>,
}

impl MigrationWriter {
    /// Creates a writer for `dir`, stamping files with the local time.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timestamp: None,
        }
    }

    /// Stamps files with a fixed time instead of the local clock.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Returns the target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path a migration called `name` would be written to.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidName`] if `name` has no usable
    /// characters.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Local::now().naive_local());
        Ok(self.dir.join(generate_migration_name(timestamp, name)?))
    }

    /// Writes `contents` as a new migration, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MigrationExists`] instead of overwriting a
    /// file, or an IO error.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|e| SchemaError::io(&self.dir, e))?;

        write_atomic(&path, contents, false).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                SchemaError::MigrationExists(path.clone())
            } else {
                SchemaError::io(&path, e)
            }
        })?;

        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}

/// Writes `contents` to `path` through a staged file in the same
/// directory, so a failed write leaves nothing behind.
///
/// Without `overwrite`, an existing file fails with
/// [`ErrorKind::AlreadyExists`] and is left untouched.
///
/// # Errors
///
/// Returns the IO error of staging, syncing or renaming the file.
pub fn write_atomic(path: &Path, contents: &str, overwrite: bool) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;
    if overwrite {
        staged.persist(path)?;
    } else {
        staged.persist_noclobber(path)?;
    }
    Ok(())
}
