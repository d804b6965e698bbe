//! Risk analysis for schema diffs.
//!
//! Collects every operation that can lose data or fail on existing rows,
//! in either direction. The generator embeds the same messages as
//! `-- WARNING:` comments, and the application shows them to the operator
//! before a migration file is written.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cast::can_cast;
use crate::diff::{FieldChange, FieldModification, SchemaDiff};
use crate::model::{Enum, Model};
use crate::types::canonical_type;

/// Category of a risky operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskKind {
    /// Forward type conversion may fail or lose data.
    RiskyCast,
    /// No automatic forward conversion exists.
    ManualCast,
    /// Forward conversion is well defined but worth knowing about.
    CastNote,
    /// Reverting the change may fail or cannot restore the old values.
    RiskyRollback,
    /// No automatic reverse conversion exists.
    ImpossibleRollback,
    /// A nullable column becomes NOT NULL.
    NotNullTightening,
    /// A NOT NULL column without default is added to an existing table.
    NotNullWithoutDefault,
    /// A column is dropped.
    ColumnDrop,
    /// A table is dropped.
    TableDrop,
    /// An enum type is dropped.
    EnumDrop,
}

/// One risky operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskWarning {
    /// Category.
    pub kind: RiskKind,
    /// Table (or enum type) the operation targets.
    pub table: String,
    /// Column, for column-level operations.
    pub column: Option<String>,
    /// Human-readable explanation, also embedded in the SQL.
    pub message: String,
}

impl RiskWarning {
    fn new(kind: RiskKind, table: &str, column: Option<&str>, message: String) -> Self {
        Self {
            kind,
            table: table.to_string(),
            column: column.map(str::to_string),
            message,
        }
    }

    /// Returns `false` for purely informational notes.
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        self.kind != RiskKind::CastNote
    }
}

impl fmt::Display for RiskWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collects the risks of applying and reverting `diff`.
#[must_use]
pub fn analyze_risks(diff: &SchemaDiff) -> Vec<RiskWarning> {
    let mut risks = Vec::new();

    for change in &diff.fields_added {
        risks.extend(added_not_null(change));
    }
    for change in &diff.fields_removed {
        risks.push(column_drop(change));
    }
    for modification in &diff.fields_modified {
        risks.extend(forward_type_risk(modification));
        risks.extend(reverse_type_risk(modification));
        risks.extend(not_null_tightening(modification));
        risks.extend(not_null_restore(modification));
    }
    for model in &diff.models_removed {
        risks.push(table_drop(model));
    }
    for enumeration in &diff.enums_removed {
        risks.push(enum_drop(enumeration));
    }
    risks
}

pub(crate) fn column_drop(change: &FieldChange) -> RiskWarning {
    let column = &change.field.column_name;
    RiskWarning::new(
        RiskKind::ColumnDrop,
        &change.table,
        Some(column),
        format!(
            "IRREVERSIBLE: Dropping column {}.{column} - all data in this column will be lost!",
            change.table
        ),
    )
}

pub(crate) fn table_drop(model: &Model) -> RiskWarning {
    RiskWarning::new(
        RiskKind::TableDrop,
        &model.table_name,
        None,
        format!(
            "IRREVERSIBLE: Dropping table {} - all data will be lost!",
            model.table_name
        ),
    )
}

pub(crate) fn enum_drop(enumeration: &Enum) -> RiskWarning {
    RiskWarning::new(
        RiskKind::EnumDrop,
        &enumeration.name,
        None,
        format!(
            "IRREVERSIBLE: Dropping enum type {} - columns still using it will block the drop",
            enumeration.name
        ),
    )
}

pub(crate) fn added_not_null(change: &FieldChange) -> Option<RiskWarning> {
    let field = &change.field;
    let has_default = field.default_expr().is_some_and(|d| d != "autoincrement()")
        || field.is_autoincrement()
        || crate::types::is_serial(&field.field_type);
    if field.is_optional || has_default {
        return None;
    }
    Some(RiskWarning::new(
        RiskKind::NotNullWithoutDefault,
        &change.table,
        Some(&field.column_name),
        format!(
            "RISKY: Adding NOT NULL column {}.{} without a default - will fail if the table has rows",
            change.table, field.column_name
        ),
    ))
}

pub(crate) fn forward_type_risk(m: &FieldModification) -> Option<RiskWarning> {
    let from = canonical_type(&m.current);
    let to = canonical_type(&m.target);
    if from == to {
        return None;
    }
    let cast = can_cast(&from, &to);
    let column = &m.target.column_name;
    let (kind, label) = if !cast.can_cast {
        (RiskKind::ManualCast, "MANUAL INTERVENTION REQUIRED")
    } else if cast.is_risky {
        (RiskKind::RiskyCast, "RISKY CONVERSION")
    } else if cast.warning.is_some() {
        (RiskKind::CastNote, "CONVERSION NOTE")
    } else {
        return None;
    };
    Some(RiskWarning::new(
        kind,
        &m.table,
        Some(column),
        format!(
            "{label}: {}.{column} from {from} to {to} - {}",
            m.table,
            cast.message()
        ),
    ))
}

pub(crate) fn reverse_type_risk(m: &FieldModification) -> Option<RiskWarning> {
    let from = canonical_type(&m.current);
    let to = canonical_type(&m.target);
    if from == to {
        return None;
    }
    let forward = can_cast(&from, &to);
    let reverse = can_cast(&to, &from);
    let column = &m.target.column_name;

    let (kind, label, reason) = if !reverse.can_cast {
        (
            RiskKind::ImpossibleRollback,
            "ROLLBACK IMPOSSIBLE",
            reverse.message().to_string(),
        )
    } else if reverse.is_risky {
        (
            RiskKind::RiskyRollback,
            "ROLLBACK RISK",
            reverse.message().to_string(),
        )
    } else if forward.is_risky {
        (
            RiskKind::RiskyRollback,
            "ROLLBACK RISK",
            "values altered by the forward conversion cannot be restored".to_string(),
        )
    } else {
        return None;
    };
    Some(RiskWarning::new(
        kind,
        &m.table,
        Some(column),
        format!("{label}: {}.{column} from {to} back to {from} - {reason}", m.table),
    ))
}

pub(crate) fn not_null_tightening(m: &FieldModification) -> Option<RiskWarning> {
    if !(m.current.is_optional && !m.target.is_optional) {
        return None;
    }
    let column = &m.target.column_name;
    Some(RiskWarning::new(
        RiskKind::NotNullTightening,
        &m.table,
        Some(column),
        format!(
            "RISKY: Making {}.{column} NOT NULL - will fail if NULL values exist",
            m.table
        ),
    ))
}

pub(crate) fn not_null_restore(m: &FieldModification) -> Option<RiskWarning> {
    if !(!m.current.is_optional && m.target.is_optional) {
        return None;
    }
    let column = &m.target.column_name;
    Some(RiskWarning::new(
        RiskKind::RiskyRollback,
        &m.table,
        Some(column),
        format!(
            "ROLLBACK RISK: Restoring NOT NULL on {}.{column} - will fail if NULL values were written",
            m.table
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn modification(current: Field, target: Field) -> FieldModification {
        FieldModification {
            table: "users".to_string(),
            current,
            target,
        }
    }

    #[test]
    fn test_text_to_integer_flags_both_directions() {
        let m = modification(
            Field::new("status", "TEXT").optional(),
            Field::new("status", "Int").optional(),
        );
        let forward = forward_type_risk(&m).unwrap();
        assert_eq!(forward.kind, RiskKind::RiskyCast);
        assert!(forward.message.starts_with("RISKY CONVERSION: users.status from TEXT to INTEGER"));

        let reverse = reverse_type_risk(&m).unwrap();
        assert_eq!(reverse.kind, RiskKind::RiskyRollback);
        assert!(reverse.message.contains("from INTEGER back to TEXT"));
    }

    #[test]
    fn test_widening_flags_only_rollback() {
        let m = modification(Field::new("n", "INTEGER"), Field::new("n", "BigInt"));
        assert!(forward_type_risk(&m).is_none());
        let reverse = reverse_type_risk(&m).unwrap();
        assert!(reverse.message.contains("INTEGER range"));
    }

    #[test]
    fn test_impossible_conversion() {
        let m = modification(Field::new("t", "TIMESTAMP"), Field::new("t", "Int"));
        assert_eq!(forward_type_risk(&m).unwrap().kind, RiskKind::ManualCast);
        assert_eq!(
            reverse_type_risk(&m).unwrap().kind,
            RiskKind::ImpossibleRollback
        );
    }

    #[test]
    fn test_nullability_risks() {
        let tighten = modification(
            Field::new("a", "TEXT").optional(),
            Field::new("a", "String"),
        );
        assert!(not_null_tightening(&tighten).is_some());
        assert!(not_null_restore(&tighten).is_none());

        let relax = modification(Field::new("a", "TEXT"), Field::new("a", "String").optional());
        assert!(not_null_tightening(&relax).is_none());
        assert!(not_null_restore(&relax).is_some());
    }

    #[test]
    fn test_added_not_null_without_default() {
        let required = FieldChange {
            table: "users".into(),
            field: Field::new("age", "Int"),
        };
        assert!(added_not_null(&required).is_some());

        let defaulted = FieldChange {
            table: "users".into(),
            field: Field::new("age", "Int").default_value("0"),
        };
        assert!(added_not_null(&defaulted).is_none());

        let optional = FieldChange {
            table: "users".into(),
            field: Field::new("age", "Int").optional(),
        };
        assert!(added_not_null(&optional).is_none());
    }

    #[test]
    fn test_analyze_collects_drops() {
        let diff = SchemaDiff {
            models_removed: vec![Model::new("legacy")],
            enums_removed: vec![Enum::new("Old", ["A"])],
            fields_removed: vec![FieldChange {
                table: "users".into(),
                field: Field::new("nickname", "TEXT"),
            }],
            ..SchemaDiff::default()
        };
        let kinds: Vec<RiskKind> = analyze_risks(&diff).iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RiskKind::ColumnDrop, RiskKind::TableDrop, RiskKind::EnumDrop]
        );
    }

    #[test]
    fn test_cast_note_needs_no_confirmation() {
        let m = modification(Field::new("flag", "INTEGER"), Field::new("flag", "Boolean"));
        let note = forward_type_risk(&m).unwrap();
        assert_eq!(note.kind, RiskKind::CastNote);
        assert!(!note.requires_confirmation());
    }
}
