//! Workflow configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default schema file location.
pub const DEFAULT_SCHEMA_PATH: &str = "schema.prisma";

/// Default migrations directory.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Where the workflow reads the schema and migrations from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Declarative schema file.
    pub schema_path: PathBuf,
    /// Directory of goose migration files.
    pub migrations_dir: PathBuf,
    /// Fail on skipped constructs instead of logging them.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            strict: false,
        }
    }
}

impl Config {
    /// Creates a configuration with the default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema file.
    #[must_use]
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = path.into();
        self
    }

    /// Sets the migrations directory.
    #[must_use]
    pub fn with_migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Enables or disables strict parsing.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.schema_path, PathBuf::from("schema.prisma"));
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert!(!config.strict);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"migrations_dir": "db/migrations"}"#).unwrap();
        assert_eq!(config.schema_path, PathBuf::from("schema.prisma"));
        assert_eq!(config.migrations_dir, PathBuf::from("db/migrations"));
    }
}
