#![allow(dead_code)]

use oxide_schema_core::prelude::*;

/// Parses schema text, failing the test on any diagnostic.
pub fn schema(source: &str) -> Schema {
    parse_schema(source)
        .into_strict()
        .unwrap_or_else(|e| panic!("Failed to parse schema:\n{source}\nError: {e}"))
}

/// Replays migration files, failing the test on any diagnostic.
pub fn replay(files: &[(&str, &str)]) -> Schema {
    replay_migrations(files.iter().copied())
        .into_strict()
        .unwrap_or_else(|e| panic!("Failed to replay migrations: {e}"))
}

/// Collapses whitespace so multi-line DDL compares against one-line
/// expectations: `( a` becomes `(a` and `a )` becomes `a)`.
pub fn squash(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("( ", "(")
        .replace(" )", ")")
}
