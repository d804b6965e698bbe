//! Workflow tests against real directories.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use oxide_schema::prelude::*;
use oxide_schema_core::risk::{RiskKind, RiskWarning};
use tempfile::TempDir;

const USERS: &str = r#"
datasource db {
  provider = "postgresql"
  url      = env("DATABASE_URL")
}

model User {
  id    Int    @id @default(autoincrement())
  email String @unique
  name  String?

  @@map("users")
}
"#;

const USERS_WITHOUT_NAME: &str = r#"
model User {
  id    Int    @id @default(autoincrement())
  email String @unique

  @@map("users")
}
"#;

// =============================================================================
// Helpers
// =============================================================================

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(schema: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("schema.prisma"), schema).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn migrations(&self) -> PathBuf {
        self.root().join("migrations")
    }

    fn set_schema(&self, schema: &str) {
        fs::write(self.root().join("schema.prisma"), schema).unwrap();
    }

    /// A workflow whose files are stamped at 2024-01-01 00:00:`second`.
    fn workflow(&self, second: u32) -> Workflow {
        Workflow::new(
            SchemaFile::new(self.root().join("schema.prisma")),
            MigrationsDir::new(self.migrations()),
            MigrationWriter::new(self.migrations()).with_timestamp(stamp(second)),
        )
    }

    fn migration_files(&self) -> Vec<String> {
        MigrationsDir::new(self.migrations())
            .migration_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

fn stamp(second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, second)
        .unwrap()
}

/// Declines and remembers what it was shown.
#[derive(Default)]
struct Decline {
    seen: Vec<RiskWarning>,
}

impl Confirm for Decline {
    fn confirm(&mut self, warnings: &[RiskWarning]) -> bool {
        self.seen.extend_from_slice(warnings);
        false
    }
}

// =============================================================================
// Generate
// =============================================================================

#[test]
fn test_initial_generate_without_migrations_dir() {
    let project = Project::new(USERS);
    let workflow = project.workflow(1);

    let plan = workflow.plan().unwrap();
    assert_eq!(plan.diff.models_added.len(), 1);

    let outcome = workflow.commit(&plan, "init", &mut Decline::default()).unwrap();
    let path = project.migrations().join("20240101000001_init.sql");
    assert_eq!(outcome, Outcome::Written(path.clone()));

    let text = fs::read_to_string(path).unwrap();
    assert!(text.starts_with("-- +goose Up\n"));
    assert!(text.contains("CREATE TABLE users ("));
    assert!(text.contains("-- +goose Down\n"));
}

#[test]
fn test_second_generate_detects_no_changes() {
    let project = Project::new(USERS);
    let first = project.workflow(1);
    let plan = first.plan().unwrap();
    first.commit(&plan, "init", &mut AlwaysConfirm).unwrap();

    let second = project.workflow(2);
    let plan = second.plan().unwrap();
    assert!(plan.is_empty());
    assert_eq!(
        second.commit(&plan, "again", &mut AlwaysConfirm).unwrap(),
        Outcome::NoChanges
    );
    assert_eq!(project.migration_files(), vec!["20240101000001_init.sql"]);
}

#[test]
fn test_declined_risky_migration_writes_nothing() {
    let project = Project::new(USERS);
    let first = project.workflow(1);
    first
        .commit(&first.plan().unwrap(), "init", &mut AlwaysConfirm)
        .unwrap();

    project.set_schema(USERS_WITHOUT_NAME);
    let second = project.workflow(2);
    let plan = second.plan().unwrap();
    let mut decline = Decline::default();

    assert_eq!(
        second.commit(&plan, "drop_name", &mut decline).unwrap(),
        Outcome::Declined
    );
    assert_eq!(decline.seen.len(), 1);
    assert_eq!(decline.seen[0].kind, RiskKind::ColumnDrop);
    assert_eq!(project.migration_files(), vec!["20240101000001_init.sql"]);
}

#[test]
fn test_confirmed_risky_migration_is_written() {
    let project = Project::new(USERS);
    let first = project.workflow(1);
    first
        .commit(&first.plan().unwrap(), "init", &mut AlwaysConfirm)
        .unwrap();

    project.set_schema(USERS_WITHOUT_NAME);
    let second = project.workflow(2);
    let plan = second.plan().unwrap();
    let Outcome::Written(path) = second.commit(&plan, "drop_name", &mut AlwaysConfirm).unwrap()
    else {
        panic!("expected a written migration");
    };
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("ALTER TABLE users DROP COLUMN IF EXISTS name;"));
    assert!(text.contains("ALTER TABLE users ADD COLUMN name TEXT;"));

    assert!(project.workflow(3).plan().unwrap().is_empty());
}

#[test]
fn test_existing_file_is_not_overwritten() {
    let project = Project::new(USERS);
    let existing = project.migrations().join("20240101000001_init.sql");
    fs::create_dir_all(project.migrations()).unwrap();
    fs::write(&existing, "-- +goose Up\n").unwrap();

    let workflow = project.workflow(1);
    let plan = workflow.plan().unwrap();
    let err = workflow.commit(&plan, "init", &mut AlwaysConfirm).unwrap_err();
    assert!(matches!(err, SchemaError::MigrationExists(p) if p == existing));
    assert_eq!(fs::read_to_string(existing).unwrap(), "-- +goose Up\n");
}

#[test]
fn test_invalid_name_is_rejected_before_confirming() {
    let project = Project::new(USERS_WITHOUT_NAME);
    let workflow = project.workflow(1);
    let plan = workflow.plan().unwrap();
    let mut decline = Decline::default();

    let err = workflow.commit(&plan, "!!!", &mut decline).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidName(_)));
    assert!(decline.seen.is_empty());
}

// =============================================================================
// Empty migrations
// =============================================================================

#[test]
fn test_empty_migration_does_not_change_the_schema() {
    let project = Project::new(USERS);
    let workflow = project.workflow(1);
    let path = workflow.write_empty("custom_sql").unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("-- +goose Up"));
    assert!(text.contains("-- +goose Down"));

    let current = project.workflow(2).load_current().unwrap();
    assert!(current.is_empty());
}

// =============================================================================
// Loading errors
// =============================================================================

#[test]
fn test_missing_schema_file() {
    let project = Project::new(USERS);
    fs::remove_file(project.root().join("schema.prisma")).unwrap();

    let err = project.workflow(1).plan().unwrap_err();
    assert!(matches!(err, SchemaError::SchemaNotFound(_)));
}

#[test]
fn test_invalid_schema_is_rejected() {
    let project = Project::new("model Log {\n  message String\n}\n");
    let err = project.workflow(1).plan().unwrap_err();
    let SchemaError::Validation(issues) = err else {
        panic!("expected validation issues, got {err}");
    };
    assert_eq!(issues.len(), 1);
    assert!(issues[0].to_string().contains("Log"));
}

#[test]
fn test_strict_mode_rejects_skipped_constructs() {
    let schema = format!("{USERS}\nthis is not a block\n");
    let project = Project::new(&schema);

    assert!(project.workflow(1).plan().is_ok());

    let err = project.workflow(1).strict(true).plan().unwrap_err();
    assert!(matches!(err, SchemaError::Parse { .. }));
}

#[test]
fn test_from_config_uses_configured_paths() {
    let project = Project::new(USERS);
    let config = Config::new()
        .with_schema_path(project.root().join("schema.prisma"))
        .with_migrations_dir(project.migrations());

    let workflow = Workflow::from_config(&config);
    assert_eq!(workflow.writer().dir(), project.migrations());
    assert_eq!(workflow.plan().unwrap().diff.models_added.len(), 1);
}
