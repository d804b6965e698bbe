//! Plan, confirm and write a migration.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use oxide_schema_core::goose;
use oxide_schema_core::prelude::*;

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::source::{MigrationsDir, SchemaFile, SchemaSource};
use crate::writer::MigrationWriter;

/// Decides whether a risky migration may be written.
pub trait Confirm {
    /// Returns `true` to proceed despite `warnings`.
    fn confirm(&mut self, warnings: &[RiskWarning]) -> bool;
}

/// Accepts every migration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _warnings: &[RiskWarning]) -> bool {
        true
    }
}

/// Asks the operator on a terminal.
///
/// Only `y` and `yes` (any case) proceed. A read failure declines.
#[derive(Debug)]
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Creates a prompt over arbitrary streams.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, warnings: &[RiskWarning]) -> io::Result<bool> {
        writeln!(
            self.output,
            "\nWARNING: The following operations may lose data or fail:"
        )?;
        for warning in warnings.iter().filter(|w| w.requires_confirmation()) {
            writeln!(self.output, "  - {warning}")?;
        }
        write!(
            self.output,
            "\nDo you want to continue? This will generate the migration with warnings. (y/N): "
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

impl Prompt<StdinLock<'static>, Stdout> {
    /// Prompts on standard input and output.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&mut self, warnings: &[RiskWarning]) -> bool {
        self.ask(warnings).unwrap_or_else(|e| {
            warn!("Failed to read confirmation: {e}");
            false
        })
    }
}

/// A computed but not yet written migration.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Structural changes.
    pub diff: SchemaDiff,
    /// Rendered SQL and its warnings.
    pub migration: GeneratedMigration,
}

impl Plan {
    /// Builds the plan that moves `current` to `target`.
    #[must_use]
    pub fn between(current: &Schema, target: &Schema) -> Self {
        let diff = diff_schemas(current, target);
        let migration = MigrationGenerator::new()
            .with_current(current)
            .with_target(target)
            .generate(&diff);
        Self { diff, migration }
    }

    /// Returns `true` if there is nothing to migrate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    /// Risks found in the plan.
    #[must_use]
    pub fn warnings(&self) -> &[RiskWarning] {
        &self.migration.warnings
    }
}

/// Result of [`Workflow::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The schemas already match; nothing was written.
    NoChanges,
    /// The operator declined; nothing was written.
    Declined,
    /// The migration was written to this path.
    Written(PathBuf),
}

/// Compares a target schema with the current one and writes migrations.
#[derive(Debug, Clone)]
pub struct Workflow<T = SchemaFile, C = MigrationsDir> {
    target: T,
    current: C,
    writer: MigrationWriter,
    strict: bool,
}

impl Workflow {
    /// Reads the schema file and migrations directory named in `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SchemaFile::new(&config.schema_path),
            MigrationsDir::new(&config.migrations_dir),
            MigrationWriter::new(&config.migrations_dir),
        )
        .strict(config.strict)
    }
}

impl<T: SchemaSource, C: SchemaSource> Workflow<T, C> {
    /// Creates a workflow from explicit parts.
    pub const fn new(target: T, current: C, writer: MigrationWriter) -> Self {
        Self {
            target,
            current,
            writer,
            strict: false,
        }
    }

    /// Fails on skipped constructs instead of logging them.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the migration writer.
    pub const fn writer(&self) -> &MigrationWriter {
        &self.writer
    }

    /// Loads and validates the target schema.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read, if strict mode rejects a
    /// skipped construct, or if the schema is structurally invalid.
    pub fn load_target(&self) -> Result<Schema> {
        let schema = self.settle(&self.target)?;
        let issues = validate(&schema);
        if issues.is_empty() {
            Ok(schema)
        } else {
            Err(SchemaError::Validation(issues))
        }
    }

    /// Loads the current schema.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read or strict mode rejects a skipped
    /// construct.
    pub fn load_current(&self) -> Result<Schema> {
        self.settle(&self.current)
    }

    /// Loads both schemas and computes the migration between them.
    ///
    /// # Errors
    ///
    /// Fails if either schema cannot be loaded.
    pub fn plan(&self) -> Result<Plan> {
        let target = self.load_target()?;
        let current = self.load_current()?;
        let plan = Plan::between(&current, &target);
        debug!(
            "{} change(s), {} warning(s)",
            plan.diff.change_count(),
            plan.warnings().len()
        );
        Ok(plan)
    }

    /// Writes `plan` as a migration called `name`.
    ///
    /// `confirm` is consulted only when a warning needs a decision.
    ///
    /// # Errors
    ///
    /// Fails on an invalid name, an existing file or an IO error.
    pub fn commit(&self, plan: &Plan, name: &str, confirm: &mut dyn Confirm) -> Result<Outcome> {
        if plan.is_empty() {
            return Ok(Outcome::NoChanges);
        }
        self.writer.path_for(name)?;

        for note in plan.warnings().iter().filter(|w| !w.requires_confirmation()) {
            info!("{note}");
        }
        if plan.migration.requires_confirmation() && !confirm.confirm(plan.warnings()) {
            info!("Migration generation cancelled.");
            return Ok(Outcome::Declined);
        }

        let contents = plan.migration.to_file_contents();
        self.writer.write(name, &contents).map(Outcome::Written)
    }

    /// Writes an empty migration for hand-written SQL.
    ///
    /// # Errors
    ///
    /// Fails on an invalid name, an existing file or an IO error.
    pub fn write_empty(&self, name: &str) -> Result<PathBuf> {
        self.writer.write(name, &goose::empty_migration())
    }

    fn settle<S: SchemaSource>(&self, source: &S) -> Result<Schema> {
        let parsed = source.load()?;
        if self.strict {
            return parsed.into_strict().map_err(|error| SchemaError::Parse {
                source_name: source.source_name(),
                error,
            });
        }
        for diagnostic in &parsed.diagnostics {
            warn!("Skipped {diagnostic}");
        }
        Ok(parsed.into_value())
    }
}
