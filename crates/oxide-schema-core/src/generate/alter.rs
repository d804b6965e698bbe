//! ALTER TABLE rendering for columns of existing tables.

use crate::cast::can_cast;
use crate::diff::{FieldChange, FieldModification};
use crate::model::Field;
use crate::risk;
use crate::types::{canonical_type, is_serial, sql_type_for_field};

use super::table::TableRenderer;
use super::Statement;

/// `ADD COLUMN`, plus its unique index. Warns when a NOT NULL column
/// without default is added.
pub(crate) fn add_column(
    renderer: &TableRenderer<'_>,
    change: &FieldChange,
    warn: bool,
) -> Vec<Statement> {
    let table = &change.table;
    let field = &change.field;
    let sql = format!(
        "ALTER TABLE {table} ADD COLUMN {};",
        renderer.column_definition(field, field.is_id())
    );
    let warning = if warn {
        risk::added_not_null(change).map(|r| r.message)
    } else {
        None
    };

    let mut statements = vec![Statement::new(sql, warning)];
    if field.is_unique() {
        statements.push(Statement::plain(format!(
            "CREATE UNIQUE INDEX idx_uniq_{table}_{col} ON {table}({col});",
            col = field.column_name
        )));
    }
    statements
}

/// `DROP COLUMN IF EXISTS`, with the data-loss warning when `warn` is set.
pub(crate) fn drop_column(change: &FieldChange, warn: bool) -> Statement {
    let sql = format!(
        "ALTER TABLE {} DROP COLUMN IF EXISTS {};",
        change.table, change.field.column_name
    );
    let warning = warn.then(|| risk::column_drop(change).message);
    Statement::new(sql, warning)
}

/// Statements moving a column from `current` to `target`.
pub(crate) fn modify_up(m: &FieldModification) -> Vec<Statement> {
    let mut statements = Vec::new();
    if m.type_changed() {
        let warning = risk::forward_type_risk(m).map(|r| r.message);
        statements.push(alter_type(&m.table, &m.current, &m.target, warning));
    }
    if m.nullability_changed() {
        let warning = risk::not_null_tightening(m).map(|r| r.message);
        statements.push(alter_nullability(&m.table, &m.target, warning));
    }
    statements
}

/// Statements moving a column back from `target` to `current`.
pub(crate) fn modify_down(m: &FieldModification) -> Vec<Statement> {
    let mut statements = Vec::new();
    if m.type_changed() {
        let warning = risk::reverse_type_risk(m).map(|r| r.message);
        statements.push(alter_type(&m.table, &m.target, &m.current, warning));
    }
    if m.nullability_changed() {
        let warning = risk::not_null_restore(m).map(|r| r.message);
        statements.push(alter_nullability(&m.table, &m.current, warning));
    }
    statements
}

/// `ALTER COLUMN ... TYPE`, or a commented-out placeholder when no
/// automatic conversion exists.
///
/// The new type keeps `@db.*` parameters and replayed precision, so
/// `DECIMAL(10, 2)` is not flattened to `NUMERIC`.
fn alter_type(table: &str, from: &Field, to: &Field, warning: Option<String>) -> Statement {
    let column = &to.column_name;
    let sql_type = column_type(to);
    let cast = can_cast(&canonical_type(from), &canonical_type(to));

    if !cast.can_cast {
        return Statement::new(
            format!(
                "-- ALTER TABLE {table} ALTER COLUMN {column} TYPE {sql_type} USING {column}::{sql_type};"
            ),
            warning,
        );
    }

    let using = if cast.cast_expression.is_empty() {
        String::new()
    } else {
        format!(" USING {column}::{sql_type}")
    };
    Statement::new(
        format!("ALTER TABLE {table} ALTER COLUMN {column} TYPE {sql_type}{using};"),
        warning,
    )
}

/// Column type as `ALTER COLUMN ... TYPE` accepts it. The serial
/// pseudo-types only exist in `CREATE TABLE`.
fn column_type(field: &Field) -> String {
    let sql_type = sql_type_for_field(field);
    if is_serial(&sql_type) {
        canonical_type(field).sql_name()
    } else {
        sql_type
    }
}

fn alter_nullability(table: &str, field: &Field, warning: Option<String>) -> Statement {
    let action = if field.is_optional {
        "DROP NOT NULL"
    } else {
        "SET NOT NULL"
    };
    Statement::new(
        format!(
            "ALTER TABLE {table} ALTER COLUMN {} {action};",
            field.column_name
        ),
        warning,
    )
}
