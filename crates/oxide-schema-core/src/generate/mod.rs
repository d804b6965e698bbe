//! goose migration generation.
//!
//! Turns a [`SchemaDiff`] into the up and down sections of a migration
//! file. Every statement is wrapped in its own statement block, and risky
//! statements carry a `-- WARNING:` line.
//!
//! Up order: enum types, added columns, dropped columns, modified columns,
//! new tables (with their indexes), dropped tables, dropped enum types.
//! Down undoes each step in reverse.

mod alter;
mod table;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::{SchemaDiff, diff_schemas};
use crate::goose;
use crate::model::{Model, Schema};
use crate::risk::{self, RiskWarning, analyze_risks};

use table::TableRenderer;

static EMPTY_SCHEMA: Schema = Schema {
    models: Vec::new(),
    enums: Vec::new(),
    datasource: None,
};

/// One SQL statement with an optional warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// The SQL, terminated with `;` (or a commented-out placeholder).
    pub sql: String,
    /// Emitted as `-- WARNING:` inside the statement block.
    pub warning: Option<String>,
}

impl Statement {
    /// Creates a statement.
    #[must_use]
    pub fn new(sql: impl Into<String>, warning: Option<String>) -> Self {
        Self {
            sql: sql.into(),
            warning,
        }
    }

    /// Creates a statement without warning.
    #[must_use]
    pub fn plain(sql: impl Into<String>) -> Self {
        Self::new(sql, None)
    }

    /// Wraps the statement in a goose statement block.
    #[must_use]
    pub fn render(&self) -> String {
        goose::wrap_statement(&self.sql, self.warning.as_deref())
    }
}

/// A generated migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMigration {
    /// Wrapped up statements.
    pub up: String,
    /// Wrapped down statements.
    pub down: String,
    /// Risks of applying and reverting this migration.
    pub warnings: Vec<RiskWarning>,
}

impl GeneratedMigration {
    /// Returns the full migration file text.
    #[must_use]
    pub fn to_file_contents(&self) -> String {
        goose::compose_migration(&self.up, &self.down)
    }

    /// Returns `true` if any warning needs an operator decision.
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        self.warnings.iter().any(RiskWarning::requires_confirmation)
    }
}

/// Generates goose SQL from schema diffs.
///
/// The optional schemas are used for lookups: foreign key targets and
/// enum-typed defaults of added tables resolve against the target schema,
/// removed tables against the current one.
///
/// # Example
///
/// ```
/// use oxide_schema_core::diff::diff_schemas;
/// use oxide_schema_core::generate::MigrationGenerator;
/// use oxide_schema_core::model::{Field, Model, Schema};
///
/// let target = Schema::new().model(
///     Model::new("users").field(Field::new("id", "Int").id().default_value("autoincrement()")),
/// );
/// let current = Schema::new();
/// let diff = diff_schemas(&current, &target);
///
/// let migration = MigrationGenerator::new()
///     .with_current(&current)
///     .with_target(&target)
///     .generate(&diff);
/// assert!(migration.up.contains("id SERIAL PRIMARY KEY"));
/// assert!(migration.down.contains("DROP TABLE IF EXISTS users;"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationGenerator<'a> {
    current: Option<&'a Schema>,
    target: Option<&'a Schema>,
}

impl<'a> MigrationGenerator<'a> {
    /// Creates a generator without lookup schemas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema the database currently has.
    #[must_use]
    pub fn with_current(mut self, current: &'a Schema) -> Self {
        self.current = Some(current);
        self
    }

    /// Sets the schema the migration moves to.
    #[must_use]
    pub fn with_target(mut self, target: &'a Schema) -> Self {
        self.target = Some(target);
        self
    }

    fn target_renderer(&self) -> TableRenderer<'a> {
        TableRenderer::new(self.target.unwrap_or(&EMPTY_SCHEMA))
    }

    fn current_renderer(&self) -> TableRenderer<'a> {
        TableRenderer::new(self.current.unwrap_or(&EMPTY_SCHEMA))
    }

    /// Forward statements.
    #[must_use]
    pub fn up_statements(&self, diff: &SchemaDiff) -> Vec<Statement> {
        let target = self.target_renderer();
        let current = self.current_renderer();
        let mut statements = Vec::new();

        for enumeration in &diff.enums_added {
            statements.push(Statement::plain(table::create_enum(enumeration)));
        }
        for change in &diff.fields_added {
            statements.extend(alter::add_column(&target, change, true));
        }
        for change in &diff.fields_removed {
            statements.push(alter::drop_column(change, true));
        }
        for modification in &diff.fields_modified {
            statements.extend(alter::modify_up(modification));
        }
        for model in dependency_order(&diff.models_added, &target) {
            statements.extend(target.create_table(model));
        }
        for model in dependency_order(&diff.models_removed, &current).into_iter().rev() {
            statements.push(Statement::new(
                table::drop_table(model),
                Some(risk::table_drop(model).message),
            ));
        }
        for enumeration in &diff.enums_removed {
            statements.push(Statement::new(
                table::drop_enum(enumeration),
                Some(risk::enum_drop(enumeration).message),
            ));
        }
        statements
    }

    /// Reverse statements.
    #[must_use]
    pub fn down_statements(&self, diff: &SchemaDiff) -> Vec<Statement> {
        let target = self.target_renderer();
        let current = self.current_renderer();
        let mut statements = Vec::new();

        for model in dependency_order(&diff.models_added, &target).into_iter().rev() {
            statements.push(Statement::plain(table::drop_table(model)));
        }
        for enumeration in &diff.enums_added {
            statements.push(Statement::plain(table::drop_enum(enumeration)));
        }
        for change in &diff.fields_added {
            statements.push(alter::drop_column(change, false));
        }
        for change in &diff.fields_removed {
            statements.extend(alter::add_column(&current, change, false));
        }
        for modification in &diff.fields_modified {
            statements.extend(alter::modify_down(modification));
        }
        for enumeration in &diff.enums_removed {
            statements.push(Statement::plain(table::create_enum(enumeration)));
        }
        for model in dependency_order(&diff.models_removed, &current) {
            statements.extend(current.create_table(model));
        }
        statements
    }

    /// Rendered up section.
    #[must_use]
    pub fn generate_up(&self, diff: &SchemaDiff) -> String {
        render_all(&self.up_statements(diff))
    }

    /// Rendered down section.
    #[must_use]
    pub fn generate_down(&self, diff: &SchemaDiff) -> String {
        render_all(&self.down_statements(diff))
    }

    /// Generates both sections and the risk list.
    #[must_use]
    pub fn generate(&self, diff: &SchemaDiff) -> GeneratedMigration {
        let up = self.up_statements(diff);
        let down = self.down_statements(diff);
        debug!(
            up = up.len(),
            down = down.len(),
            "Generated migration statements"
        );
        GeneratedMigration {
            up: render_all(&up),
            down: render_all(&down),
            warnings: analyze_risks(diff),
        }
    }
}

/// Diffs `current` against `target` and generates the migration.
#[must_use]
pub fn generate_migration(current: &Schema, target: &Schema) -> GeneratedMigration {
    let diff = diff_schemas(current, target);
    MigrationGenerator::new()
        .with_current(current)
        .with_target(target)
        .generate(&diff)
}

fn render_all(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(Statement::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Orders models so referenced tables come first. Models caught in a
/// cycle keep their declaration order.
fn dependency_order<'m>(models: &'m [Model], renderer: &TableRenderer<'_>) -> Vec<&'m Model> {
    let pending_tables: BTreeSet<&str> = models.iter().map(|m| m.table_name.as_str()).collect();
    let dependencies: Vec<Vec<String>> = models
        .iter()
        .map(|m| {
            renderer
                .referenced_tables(m)
                .into_iter()
                .filter(|t| *t != m.table_name && pending_tables.contains(t.as_str()))
                .collect()
        })
        .collect();

    let mut emitted: BTreeSet<&str> = BTreeSet::new();
    let mut ordered: Vec<&Model> = Vec::with_capacity(models.len());
    let mut remaining: Vec<usize> = (0..models.len()).collect();

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|&i| {
            dependencies[i]
                .iter()
                .all(|table| emitted.contains(table.as_str()))
        });
        // Cycle: emit the rest as declared.
        let index = ready.unwrap_or(0);
        let model = &models[remaining.remove(index)];
        emitted.insert(model.table_name.as_str());
        ordered.push(model);
    }
    ordered
}
