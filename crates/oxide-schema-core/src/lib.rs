//! Declarative schema to goose migration engine.
//!
//! `oxide-schema-core` compares the schema a project declares with the
//! schema its existing migrations produce, and writes the SQL that moves
//! the database from one to the other:
//! - The schema file is parsed into a [`Schema`](model::Schema)
//! - Existing migrations are replayed into another `Schema`
//! - The two are diffed by physical table and column names
//! - The diff is rendered as goose up and down sections, with risky
//!   conversions annotated
//!
//! # Architecture
//!
//! - **Parser** - Schema text to [`Schema`](model::Schema), with diagnostics
//! - **Replay** - goose SQL files to [`Schema`](model::Schema)
//! - **Types / Cast** - Canonical type vocabulary and the cast-safety matrix
//! - **Diff** - Structural comparison of two schemas
//! - **Generate** - PostgreSQL DDL in goose format
//! - **Risk** - Data-loss and failure analysis of a diff
//! - **Validate** - Structural checks on a parsed schema
//! - **Baseline** - Adopting a database that predates its migrations
//!
//! The engine does no I/O: callers pass in text and receive text.
//!
//! # Example
//!
//! ```rust
//! use oxide_schema_core::prelude::*;
//!
//! let target = parse_schema(
//!     r#"
//! model Organization {
//!   id   Int    @id @default(autoincrement())
//!   name String @unique
//!   @@map("organizations")
//! }
//! "#,
//! )
//! .into_value();
//!
//! let current = replay_migrations(Vec::<(&str, &str)>::new()).into_value();
//! let migration = generate_migration(&current, &target);
//!
//! assert!(migration.up.contains("CREATE TABLE organizations"));
//! assert!(migration.down.contains("DROP TABLE IF EXISTS organizations;"));
//! ```

pub mod baseline;
pub mod cast;
pub mod diff;
pub mod generate;
pub mod goose;
pub mod model;
pub mod parser;
pub mod relation;
pub mod risk;
pub mod sql;
pub mod types;
pub mod validate;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::baseline::{
        Introspect, IntrospectedColumn, IntrospectedIndex, IntrospectedTable,
        baseline_migration, introspected_schema, render_schema_file,
    };
    pub use crate::cast::{CastResult, can_cast};
    pub use crate::diff::{FieldChange, FieldModification, SchemaDiff, diff_schemas};
    pub use crate::generate::{GeneratedMigration, MigrationGenerator, generate_migration};
    pub use crate::model::{Enum, Field, FieldAttribute, Model, ModelAttribute, Schema};
    pub use crate::parser::{Diagnostic, DiagnosticKind, Parsed, StrictParseError, parse_schema};
    pub use crate::relation::{ReferentialAction, Relation};
    pub use crate::risk::{RiskKind, RiskWarning, analyze_risks};
    pub use crate::sql::{SchemaReplayer, replay_migrations};
    pub use crate::types::{CanonicalType, canonical_type, map_type, normalize};
    pub use crate::validate::{ValidationIssue, validate};
}
