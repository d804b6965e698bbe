//! Type mapping between declarative and PostgreSQL types.
//!
//! Declarative fields carry names like `String` or `Int`; fields rebuilt
//! from migrations carry SQL names like `TEXT` or `SERIAL`. Both are
//! normalized to a [`CanonicalType`] before comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Field;

/// Shared type vocabulary for comparing declarative and SQL-origin fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    /// Unbounded text.
    Text,
    /// Variable-length text with an optional length limit.
    Varchar(Option<u32>),
    /// 32-bit integer (including `SERIAL`).
    Integer,
    /// 64-bit integer (including `BIGSERIAL`).
    BigInt,
    /// Double precision float.
    Double,
    /// Arbitrary precision number, regardless of precision and scale.
    Decimal,
    /// Boolean.
    Boolean,
    /// Timestamp without time zone.
    Timestamp,
    /// JSON, stored as `JSONB`.
    Json,
    /// Binary data.
    Bytes,
    /// Anything else: enum types, `UUID`, `TIMESTAMPTZ`... Compared
    /// case-insensitively, stored lower-cased.
    Other(String),
}

impl CanonicalType {
    /// Returns the SQL spelling of this canonical type.
    #[must_use]
    pub fn sql_name(&self) -> String {
        match self {
            Self::Text => "TEXT".to_string(),
            Self::Varchar(Some(len)) => format!("VARCHAR({len})"),
            Self::Varchar(None) => "VARCHAR".to_string(),
            Self::Integer => "INTEGER".to_string(),
            Self::BigInt => "BIGINT".to_string(),
            Self::Double => "DOUBLE PRECISION".to_string(),
            Self::Decimal => "NUMERIC".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Json => "JSONB".to_string(),
            Self::Bytes => "BYTEA".to_string(),
            Self::Other(name) => name.to_uppercase(),
        }
    }

    /// Returns `true` for `Text` and `Varchar`.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Varchar(_))
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_name())
    }
}

/// Maps a declarative scalar type to its PostgreSQL type.
///
/// Unknown names (enum types, already-SQL names) pass through unchanged.
#[must_use]
pub fn map_type(declarative: &str) -> String {
    match declarative {
        "String" => "TEXT",
        "Int" => "INTEGER",
        "BigInt" => "BIGINT",
        "Float" => "DOUBLE PRECISION",
        "Decimal" => "NUMERIC",
        "Boolean" => "BOOLEAN",
        "DateTime" => "TIMESTAMP",
        "Json" => "JSONB",
        "Bytes" => "BYTEA",
        other => other,
    }
    .to_string()
}

/// Returns the column type for a field, honoring `@db.*` overrides.
///
/// `@db.VarChar(255)` renders as `VARCHAR(255)` and `@db.Decimal(10, 2)`
/// as `DECIMAL(10, 2)`.
#[must_use]
pub fn sql_type_for_field(field: &Field) -> String {
    field
        .native_type()
        .and_then(|attr| native_sql_type(&attr.name["db.".len()..], &attr.args))
        .unwrap_or_else(|| map_type(&field.field_type))
}

fn native_sql_type(name: &str, args: &[String]) -> Option<String> {
    let base = match name {
        "VarChar" => "VARCHAR",
        "Char" => "CHAR",
        "Text" => "TEXT",
        "Decimal" => "DECIMAL",
        "Uuid" => "UUID",
        "SmallInt" => "SMALLINT",
        "Integer" => "INTEGER",
        "BigInt" => "BIGINT",
        "Real" => "REAL",
        "DoublePrecision" => "DOUBLE PRECISION",
        "Boolean" => "BOOLEAN",
        "Date" => "DATE",
        "Time" => "TIME",
        "Timestamp" => "TIMESTAMP",
        "Timestamptz" => "TIMESTAMPTZ",
        "Json" => "JSON",
        "JsonB" => "JSONB",
        "ByteA" => "BYTEA",
        _ => return None,
    };
    if args.is_empty() {
        Some(base.to_string())
    } else {
        Some(format!("{base}({})", args.join(", ")))
    }
}

/// Normalizes a declarative or SQL type name.
#[must_use]
pub fn normalize(type_name: &str) -> CanonicalType {
    let trimmed = type_name.trim();
    match trimmed {
        "String" => return CanonicalType::Text,
        "Int" => return CanonicalType::Integer,
        "BigInt" => return CanonicalType::BigInt,
        "Float" => return CanonicalType::Double,
        "Decimal" => return CanonicalType::Decimal,
        "Boolean" => return CanonicalType::Boolean,
        "DateTime" => return CanonicalType::Timestamp,
        "Json" => return CanonicalType::Json,
        "Bytes" => return CanonicalType::Bytes,
        _ => {}
    }

    let upper = trimmed.to_uppercase();
    let (base, params) = match upper.split_once('(') {
        Some((base, rest)) => (base.trim(), rest.split(')').next().unwrap_or_default()),
        None => (upper.as_str(), ""),
    };
    let base = base.split_whitespace().collect::<Vec<_>>().join(" ");

    match base.as_str() {
        "TEXT" => CanonicalType::Text,
        "VARCHAR" | "CHARACTER VARYING" => CanonicalType::Varchar(params.trim().parse().ok()),
        "INTEGER" | "INT" | "INT4" | "SERIAL" | "SERIAL4" => CanonicalType::Integer,
        "BIGINT" | "INT8" | "BIGSERIAL" | "SERIAL8" => CanonicalType::BigInt,
        "DOUBLE PRECISION" | "FLOAT" | "FLOAT8" => CanonicalType::Double,
        "NUMERIC" | "DECIMAL" => CanonicalType::Decimal,
        "BOOLEAN" | "BOOL" => CanonicalType::Boolean,
        "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => CanonicalType::Timestamp,
        "JSONB" | "JSON" => CanonicalType::Json,
        "BYTEA" => CanonicalType::Bytes,
        _ => CanonicalType::Other(trimmed.to_lowercase()),
    }
}

/// Normalizes the effective column type of a field.
#[must_use]
pub fn canonical_type(field: &Field) -> CanonicalType {
    normalize(&sql_type_for_field(field))
}

/// Returns `true` for the `SERIAL` family, with or without a declarative
/// `autoincrement()` default.
#[must_use]
pub fn is_serial(type_name: &str) -> bool {
    matches!(
        type_name.trim().to_uppercase().as_str(),
        "SERIAL" | "SERIAL4" | "BIGSERIAL" | "SERIAL8"
    )
}
