//! Schema differ.
//!
//! Compares the current schema (replayed from migrations) with the target
//! schema (parsed from the schema file). Tables are matched by physical
//! table name and columns by physical column name, so renaming a model or
//! field without changing its mapping is not a change.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Enum, Field, Model, Schema};
use crate::types::canonical_type;

/// A column added to or removed from an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Physical table name.
    pub table: String,
    /// The added (target) or removed (current) field.
    pub field: Field,
}

/// A column present on both sides whose type or nullability differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModification {
    /// Physical table name.
    pub table: String,
    /// Field as the database has it now.
    pub current: Field,
    /// Field as the schema file declares it.
    pub target: Field,
}

impl FieldModification {
    /// Returns `true` if the canonical types differ.
    #[must_use]
    pub fn type_changed(&self) -> bool {
        canonical_type(&self.current) != canonical_type(&self.target)
    }

    /// Returns `true` if nullability differs.
    #[must_use]
    pub const fn nullability_changed(&self) -> bool {
        self.current.is_optional != self.target.is_optional
    }
}

/// Structural difference between two schemas.
///
/// Tables and enums follow the declaration order of the schema they come
/// from; fields follow their model's field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Tables only in the target.
    pub models_added: Vec<Model>,
    /// Tables only in the current schema.
    pub models_removed: Vec<Model>,
    /// Enum types only in the target.
    pub enums_added: Vec<Enum>,
    /// Enum types only in the current schema.
    pub enums_removed: Vec<Enum>,
    /// Columns only in the target, for tables on both sides.
    pub fields_added: Vec<FieldChange>,
    /// Columns only in the current schema, for tables on both sides.
    pub fields_removed: Vec<FieldChange>,
    /// Columns on both sides that differ.
    pub fields_modified: Vec<FieldModification>,
}

impl SchemaDiff {
    /// Returns `true` if there is nothing to migrate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// Total number of changes.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.models_added.len()
            + self.models_removed.len()
            + self.enums_added.len()
            + self.enums_removed.len()
            + self.fields_added.len()
            + self.fields_removed.len()
            + self.fields_modified.len()
    }
}

/// Computes the difference between `current` and `target`.
#[must_use]
pub fn diff_schemas(current: &Schema, target: &Schema) -> SchemaDiff {
    let current_tables: HashMap<&str, &Model> = current
        .models
        .iter()
        .map(|m| (m.table_name.as_str(), m))
        .collect();
    let target_tables: HashMap<&str, &Model> = target
        .models
        .iter()
        .map(|m| (m.table_name.as_str(), m))
        .collect();

    let mut diff = SchemaDiff::default();

    for model in &target.models {
        match current_tables.get(model.table_name.as_str()) {
            None => {
                debug!(table = %model.table_name, "Table added");
                diff.models_added.push(model.clone());
            }
            Some(existing) => diff_model(&mut diff, current, existing, target, model),
        }
    }
    for model in &current.models {
        if !target_tables.contains_key(model.table_name.as_str()) {
            debug!(table = %model.table_name, "Table removed");
            diff.models_removed.push(model.clone());
        }
    }

    let current_enums: BTreeSet<&str> = current.enums.iter().map(|e| e.name.as_str()).collect();
    let target_enums: BTreeSet<&str> = target.enums.iter().map(|e| e.name.as_str()).collect();
    diff.enums_added = target
        .enums
        .iter()
        .filter(|e| !current_enums.contains(e.name.as_str()))
        .cloned()
        .collect();
    diff.enums_removed = current
        .enums
        .iter()
        .filter(|e| !target_enums.contains(e.name.as_str()))
        .cloned()
        .collect();

    debug!(changes = diff.change_count(), "Computed schema diff");
    diff
}

fn diff_model(
    diff: &mut SchemaDiff,
    current_schema: &Schema,
    current: &Model,
    target_schema: &Schema,
    target: &Model,
) {
    let table = &target.table_name;
    let current_columns: HashMap<&str, &Field> = current
        .fields
        .iter()
        .filter(|f| current_schema.materializes(f))
        .map(|f| (f.column_name.as_str(), f))
        .collect();
    let target_columns: HashMap<&str, &Field> = target
        .fields
        .iter()
        .filter(|f| target_schema.materializes(f))
        .map(|f| (f.column_name.as_str(), f))
        .collect();

    for field in target.fields.iter().filter(|f| target_schema.materializes(f)) {
        match current_columns.get(field.column_name.as_str()) {
            None => diff.fields_added.push(FieldChange {
                table: table.clone(),
                field: field.clone(),
            }),
            Some(existing) if !fields_equal(existing, field) => {
                debug!(table = %table, column = %field.column_name, "Column modified");
                diff.fields_modified.push(FieldModification {
                    table: table.clone(),
                    current: (*existing).clone(),
                    target: field.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for field in current.fields.iter().filter(|f| current_schema.materializes(f)) {
        if !target_columns.contains_key(field.column_name.as_str()) {
            diff.fields_removed.push(FieldChange {
                table: table.clone(),
                field: field.clone(),
            });
        }
    }
}

/// Compares canonical type, nullability and list-ness. Attribute-level
/// differences such as `@unique` are not considered.
fn fields_equal(current: &Field, target: &Field) -> bool {
    canonical_type(current) == canonical_type(target)
        && current.is_optional == target.is_optional
        && current.is_array == target.is_array
}
