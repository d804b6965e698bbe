//! Schema reconstruction from migration files.
//!
//! Replays the up sections of previously generated migrations, in file
//! name order, against an initially empty [`Schema`]. The result is the
//! schema as the database sees it after every migration has run.

use tracing::{debug, info};

use super::scanner::split_statements;
use super::statement::{
    AlterAction, ColumnDef, EnumValuePosition, SqlStatement, TableConstraint, parse_statement,
};
use crate::goose;
use crate::model::{Enum, Field, FieldAttribute, Model, ModelAttribute, Schema};
use crate::parser::{Diagnostic, DiagnosticKind, Parsed};

/// Accumulates schema state from SQL statements.
#[derive(Debug, Default)]
pub struct SchemaReplayer {
    schema: Schema,
    diagnostics: Vec<Diagnostic>,
}

impl SchemaReplayer {
    /// Creates a replayer over an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema accumulated so far.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Consumes the replayer.
    #[must_use]
    pub fn finish(self) -> Parsed<Schema> {
        Parsed {
            value: self.schema,
            diagnostics: self.diagnostics,
        }
    }

    /// Replays the up section of one migration file.
    ///
    /// A file without an up marker contributes nothing.
    pub fn replay_file(&mut self, name: &str, text: &str) {
        let Some(up) = goose::up_section(text) else {
            debug!(file = name, "Skipping migration without up section");
            self.diagnostics.push(
                Diagnostic::new(DiagnosticKind::MissingUpSection, name).in_source(name),
            );
            return;
        };

        let before = self.diagnostics.len();
        self.replay_sql(up);
        for diagnostic in &mut self.diagnostics[before..] {
            diagnostic.source = Some(name.to_string());
        }
    }

    /// Replays every statement in a SQL fragment.
    pub fn replay_sql(&mut self, sql: &str) {
        for tokens in split_statements(sql) {
            let statement = parse_statement(&tokens);
            self.apply(&statement);
        }
    }

    /// Applies one statement.
    pub fn apply(&mut self, statement: &SqlStatement) {
        match statement {
            SqlStatement::CreateTable {
                name,
                if_not_exists,
                columns,
                constraints,
            } => self.create_table(name, *if_not_exists, columns, constraints),

            SqlStatement::AlterTable { name, actions } => self.alter_table(name, actions),

            SqlStatement::DropTable { names, if_exists } => {
                for name in names {
                    let before = self.schema.models.len();
                    self.schema.models.retain(|m| m.table_name != *name);
                    if before == self.schema.models.len() && !if_exists {
                        self.report(DiagnosticKind::UnknownTable, name);
                    }
                }
            }

            SqlStatement::CreateEnum { name, values } => {
                self.schema.enums.retain(|e| e.name != *name);
                self.schema.enums.push(Enum::new(name.clone(), values.clone()));
            }

            SqlStatement::AddEnumValue {
                name,
                value,
                position,
            } => {
                let Some(enumeration) = self.schema.enums.iter_mut().find(|e| e.name == *name)
                else {
                    self.report(DiagnosticKind::UnknownType, name);
                    return;
                };
                if !enumeration.values.contains(value) {
                    let index = match position {
                        Some(EnumValuePosition::Before(other)) => {
                            enumeration.values.iter().position(|v| v == other)
                        }
                        Some(EnumValuePosition::After(other)) => enumeration
                            .values
                            .iter()
                            .position(|v| v == other)
                            .map(|i| i + 1),
                        None => None,
                    };
                    let index = index.unwrap_or(enumeration.values.len());
                    enumeration.values.insert(index, value.clone());
                }
            }

            SqlStatement::DropType { names, if_exists } => {
                for name in names {
                    let before = self.schema.enums.len();
                    self.schema.enums.retain(|e| e.name != *name);
                    if before == self.schema.enums.len() && !if_exists {
                        self.report(DiagnosticKind::UnknownType, name);
                    }
                }
            }

            SqlStatement::CreateIndex {
                table,
                columns,
                unique,
                ..
            } => {
                let Some(model) = self.schema.get_table_mut(table) else {
                    self.report(DiagnosticKind::UnknownTable, table);
                    return;
                };
                let name = if *unique { "unique" } else { "index" };
                apply_column_set(model, name, columns);
            }

            SqlStatement::DropIndex => {}

            SqlStatement::Unknown(sql) => {
                debug!(statement = %sql, "Skipping unrecognized statement");
                self.report(DiagnosticKind::UnrecognizedStatement, sql);
            }
        }
    }

    fn create_table(
        &mut self,
        name: &str,
        if_not_exists: bool,
        columns: &[ColumnDef],
        constraints: &[TableConstraint],
    ) {
        if self.schema.get_table(name).is_some() {
            if if_not_exists {
                return;
            }
            debug!(table = name, "Table created twice, keeping the later definition");
            self.schema.models.retain(|m| m.table_name != name);
        }

        let mut model = Model::new(name);
        model.fields = columns.iter().map(field_from_column).collect();
        for constraint in constraints {
            apply_constraint(&mut model, constraint);
        }
        self.schema.models.push(model);
    }

    fn alter_table(&mut self, name: &str, actions: &[AlterAction]) {
        let Some(model) = self.schema.get_table_mut(name) else {
            self.report(DiagnosticKind::UnknownTable, name);
            return;
        };

        for action in actions {
            if let Err(diagnostic) = apply_action(model, action) {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn report(&mut self, kind: DiagnosticKind, snippet: &str) {
        self.diagnostics.push(Diagnostic::new(kind, snippet));
    }
}

/// Replays migration files in file name order.
///
/// Only `*.sql` names are considered; everything else is ignored.
#[must_use]
pub fn replay_migrations<'a, I>(files: I) -> Parsed<Schema>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut files: Vec<(&str, &str)> = files
        .into_iter()
        .filter(|(name, _)| name.ends_with(".sql"))
        .collect();
    files.sort_by(|a, b| a.0.cmp(b.0));

    let mut replayer = SchemaReplayer::new();
    for (name, text) in &files {
        debug!(file = name, "Replaying migration");
        replayer.replay_file(name, text);
    }

    let parsed = replayer.finish();
    info!(
        files = files.len(),
        tables = parsed.value.models.len(),
        enums = parsed.value.enums.len(),
        "Reconstructed schema from migrations"
    );
    parsed
}

fn field_from_column(column: &ColumnDef) -> Field {
    let mut field = Field::new(column.name.as_str(), column.data_type.as_str());
    field.is_optional = column.is_nullable();
    if column.primary_key {
        field.attributes.push(FieldAttribute::new("id"));
    }
    if column.unique {
        field.attributes.push(FieldAttribute::new("unique"));
    }
    if let Some(default) = &column.default {
        field
            .attributes
            .push(FieldAttribute::new("default").arg(default.as_str()));
    }
    field
}

fn apply_action(model: &mut Model, action: &AlterAction) -> Result<(), Diagnostic> {
    let table = model.table_name.clone();
    let unknown_column =
        |name: &str| Diagnostic::new(DiagnosticKind::UnknownColumn, format!("{table}.{name}"));

    match action {
        AlterAction::AddColumn {
            column,
            if_not_exists,
        } => {
            if model.get_column(&column.name).is_some() {
                if *if_not_exists {
                    return Ok(());
                }
                model.fields.retain(|f| f.column_name != column.name);
            }
            model.fields.push(field_from_column(column));
        }

        AlterAction::DropColumn { name, if_exists } => {
            let before = model.fields.len();
            model.fields.retain(|f| f.column_name != *name);
            if before == model.fields.len() && !if_exists {
                return Err(unknown_column(name));
            }
        }

        AlterAction::AlterType { column, data_type } => {
            let field = model
                .get_column_mut(column)
                .ok_or_else(|| unknown_column(column))?;
            field.field_type.clone_from(data_type);
        }

        AlterAction::SetNotNull(column) | AlterAction::DropNotNull(column) => {
            let optional = matches!(action, AlterAction::DropNotNull(_));
            let field = model
                .get_column_mut(column)
                .ok_or_else(|| unknown_column(column))?;
            field.is_optional = optional;
        }

        AlterAction::SetDefault { column, expr } => {
            let field = model
                .get_column_mut(column)
                .ok_or_else(|| unknown_column(column))?;
            field.attributes.retain(|a| a.name != "default");
            field
                .attributes
                .push(FieldAttribute::new("default").arg(expr.as_str()));
        }

        AlterAction::DropDefault(column) => {
            let field = model
                .get_column_mut(column)
                .ok_or_else(|| unknown_column(column))?;
            field.attributes.retain(|a| a.name != "default");
        }

        AlterAction::RenameColumn { from, to } => {
            let field = model
                .get_column_mut(from)
                .ok_or_else(|| unknown_column(from))?;
            field.name.clone_from(to);
            field.column_name.clone_from(to);
            for attribute in &mut model.attributes {
                let names = attribute.field_names();
                if names.contains(from) {
                    let renamed: Vec<&str> = names
                        .iter()
                        .map(|n| if n == from { to.as_str() } else { n.as_str() })
                        .collect();
                    *attribute = ModelAttribute::with_fields(attribute.name.clone(), &renamed);
                }
            }
        }

        AlterAction::RenameTable(name) => {
            model.name.clone_from(name);
            model.table_name.clone_from(name);
        }

        AlterAction::AddConstraint(constraint) => apply_constraint(model, constraint),

        AlterAction::Other(sql) => {
            debug!(table = %model.table_name, action = %sql, "Skipping unrecognized action");
            return Err(Diagnostic::new(DiagnosticKind::UnrecognizedStatement, sql));
        }
    }
    Ok(())
}

fn apply_constraint(model: &mut Model, constraint: &TableConstraint) {
    match constraint {
        TableConstraint::PrimaryKey(columns) => {
            for column in columns {
                if let Some(field) = model.get_column_mut(column) {
                    field.is_optional = false;
                }
            }
            apply_column_set(model, "id", columns);
        }
        TableConstraint::Unique(columns) => apply_column_set(model, "unique", columns),
        TableConstraint::Other => {}
    }
}

/// Records a key, unique set or index over columns. A single-column key
/// or unique set becomes a field attribute; anything else a block one.
fn apply_column_set(model: &mut Model, name: &str, columns: &[String]) {
    if columns.iter().any(|c| model.get_column(c).is_none()) {
        debug!(table = %model.table_name, attribute = name, "Index references unknown column");
        return;
    }

    if let [column] = columns {
        if name != "index" {
            if let Some(field) = model.get_column_mut(column) {
                if !field.has_attribute(name) {
                    field.attributes.push(FieldAttribute::new(name));
                }
            }
            return;
        }
    }

    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let attribute = ModelAttribute::with_fields(name, &names);
    if !model.attributes.contains(&attribute) {
        model.attributes.push(attribute);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(sql: &str) -> Parsed<Schema> {
        let mut replayer = SchemaReplayer::new();
        replayer.replay_sql(sql);
        replayer.finish()
    }

    #[test]
    fn test_create_and_alter() {
        let parsed = replay(
            "CREATE TABLE users (id SERIAL PRIMARY KEY, name TEXT);
             ALTER TABLE users ADD COLUMN age INTEGER NOT NULL;
             ALTER TABLE users ALTER COLUMN name TYPE VARCHAR(100);
             ALTER TABLE users DROP COLUMN IF EXISTS missing;",
        );
        assert!(parsed.is_clean(), "{:?}", parsed.diagnostics);
        let users = parsed.value.get_table("users").unwrap();

        assert_eq!(users.fields.len(), 3);
        assert!(users.get_column("id").unwrap().is_id());
        assert_eq!(users.get_column("name").unwrap().field_type, "VARCHAR(100)");
        assert!(users.get_column("name").unwrap().is_optional);
        assert!(!users.get_column("age").unwrap().is_optional);
    }

    #[test]
    fn test_drop_column_and_table() {
        let parsed = replay(
            "CREATE TABLE a (id INTEGER, legacy TEXT);
             ALTER TABLE a DROP COLUMN legacy;
             CREATE TABLE b (id INTEGER);
             DROP TABLE IF EXISTS b;",
        );
        let schema = parsed.value;
        assert_eq!(schema.models.len(), 1);
        assert!(schema.get_table("a").unwrap().get_column("legacy").is_none());
    }

    #[test]
    fn test_enum_lifecycle() {
        let parsed = replay(
            "CREATE TYPE Status AS ENUM ('A', 'C');
             ALTER TYPE Status ADD VALUE 'B' BEFORE 'C';
             ALTER TYPE Status ADD VALUE IF NOT EXISTS 'A';
             CREATE TYPE Gone AS ENUM ('X');
             DROP TYPE IF EXISTS Gone;",
        );
        let schema = parsed.value;
        assert_eq!(schema.enums.len(), 1);
        assert_eq!(schema.enums[0].values, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_nullability_and_defaults() {
        let parsed = replay(
            "CREATE TABLE t (a TEXT, b TEXT NOT NULL DEFAULT 'x');
             ALTER TABLE t ALTER COLUMN a SET NOT NULL, ALTER COLUMN b DROP NOT NULL;
             ALTER TABLE t ALTER COLUMN b DROP DEFAULT, ALTER COLUMN a SET DEFAULT 'y';",
        );
        let t = parsed.value.get_table("t").cloned().unwrap();
        assert!(!t.get_column("a").unwrap().is_optional);
        assert!(t.get_column("b").unwrap().is_optional);
        assert_eq!(t.get_column("a").unwrap().default_expr(), Some("'y'"));
        assert_eq!(t.get_column("b").unwrap().default_expr(), None);
    }

    #[test]
    fn test_indexes_become_attributes() {
        let parsed = replay(
            "CREATE TABLE users (id INTEGER NOT NULL, email TEXT NOT NULL, org INTEGER, PRIMARY KEY (id));
             CREATE UNIQUE INDEX idx_uniq_users_email ON users(email);
             CREATE UNIQUE INDEX idx_uniq_users_org_email ON users(org, email);
             CREATE INDEX idx_users_org ON users(org);",
        );
        let users = parsed.value.get_table("users").cloned().unwrap();
        assert!(users.get_column("id").unwrap().is_id());
        assert!(users.get_column("email").unwrap().is_unique());
        assert_eq!(
            users.attributes,
            vec![
                ModelAttribute::with_fields("unique", &["org", "email"]),
                ModelAttribute::with_fields("index", &["org"]),
            ]
        );
    }

    #[test]
    fn test_composite_primary_key() {
        let parsed = replay("CREATE TABLE m (a INTEGER, b INTEGER, PRIMARY KEY (a, b));");
        let m = parsed.value.get_table("m").cloned().unwrap();
        assert_eq!(m.composite_key().unwrap(), vec!["a", "b"]);
        assert!(!m.get_column("a").unwrap().is_optional);
    }

    #[test]
    fn test_renames() {
        let parsed = replay(
            "CREATE TABLE a (x INTEGER, y INTEGER, PRIMARY KEY (x, y));
             ALTER TABLE a RENAME COLUMN x TO z;
             ALTER TABLE a RENAME TO b;",
        );
        let b = parsed.value.get_table("b").cloned().unwrap();
        assert!(b.get_column("z").is_some());
        assert_eq!(b.composite_key().unwrap(), vec!["z", "y"]);
    }

    #[test]
    fn test_unknown_targets_are_reported() {
        let parsed = replay(
            "ALTER TABLE ghost ADD COLUMN a TEXT;
             CREATE TABLE t (id INTEGER);
             ALTER TABLE t DROP COLUMN nope;
             INSERT INTO t VALUES (1);",
        );
        let kinds: Vec<_> = parsed.diagnostics.iter().map(|d| d.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::UnknownTable,
                DiagnosticKind::UnknownColumn,
                DiagnosticKind::UnrecognizedStatement,
            ]
        );
        assert_eq!(parsed.value.models.len(), 1);
    }

    #[test]
    fn test_create_if_not_exists_keeps_existing() {
        let parsed = replay(
            "CREATE TABLE t (id INTEGER, extra TEXT);
             CREATE TABLE IF NOT EXISTS t (id INTEGER);",
        );
        assert_eq!(parsed.value.models[0].fields.len(), 2);
    }

    #[test]
    fn test_replay_migrations_orders_by_name_and_skips_non_sql() {
        let first = "-- +goose Up\nCREATE TABLE a (id INTEGER);\n-- +goose Down\nDROP TABLE a;\n";
        let second = "-- +goose Up\nALTER TABLE a ADD COLUMN b TEXT;\n";
        let parsed = replay_migrations([
            ("20240102000000_add_b.sql", second),
            ("README.md", "not sql"),
            ("20240101000000_init.sql", first),
        ]);

        assert!(parsed.is_clean(), "{:?}", parsed.diagnostics);
        let a = parsed.value.get_table("a").cloned().unwrap();
        assert_eq!(a.fields.len(), 2);
    }

    #[test]
    fn test_file_without_up_marker() {
        let parsed = replay_migrations([("20240101000000_x.sql", "CREATE TABLE a (id INTEGER);")]);
        assert!(parsed.value.models.is_empty());
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::MissingUpSection);
        assert_eq!(
            parsed.diagnostics[0].source.as_deref(),
            Some("20240101000000_x.sql")
        );
    }
}
