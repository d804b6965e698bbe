//! Baselines for databases that predate their migrations.
//!
//! Takes a description of the live tables (from whatever reads
//! `information_schema`) and produces three things:
//!
//! - a baseline migration that is a no-op on the existing database,
//! - a schema file describing the same tables,
//! - a [`Schema`] of the tables, as if replayed from migrations.
//!
//! Diffing the parsed schema file against the introspected schema yields
//! no changes, so the first `generate` after a baseline is empty.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::goose;
use crate::model::{Datasource, Field, FieldAttribute, Model, ModelAttribute, Schema};

/// One column as the database reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedColumn {
    /// Column name.
    pub name: String,
    /// Data type as reported, e.g. `character varying(255)` or `int4`.
    pub data_type: String,
    /// Whether the column accepts NULL.
    #[serde(default)]
    pub is_nullable: bool,
    /// Default expression as reported.
    #[serde(default)]
    pub default: Option<String>,
    /// Backed by a sequence.
    #[serde(default)]
    pub is_auto_increment: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Has a single-column unique constraint.
    #[serde(default)]
    pub is_unique: bool,
}

/// One index as the database reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedIndex {
    /// Index name.
    pub name: String,
    /// Indexed columns in order.
    pub columns: Vec<String>,
    /// Unique index.
    #[serde(default)]
    pub is_unique: bool,
}

/// One table as the database reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedTable {
    /// Table name.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<IntrospectedColumn>,
    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<IntrospectedIndex>,
}

impl IntrospectedTable {
    fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether a column is unique through a constraint or a single-column
    /// unique index.
    fn is_unique_column(&self, column: &IntrospectedColumn) -> bool {
        !column.is_primary_key
            && (column.is_unique
                || self
                    .indexes
                    .iter()
                    .any(|i| i.is_unique && i.columns == [column.name.as_str()]))
    }

    /// Indexes not already expressed by the primary key or a unique column.
    fn secondary_indexes(&self) -> impl Iterator<Item = &IntrospectedIndex> {
        let primary_key = self.primary_key();
        self.indexes.iter().filter(move |index| {
            let covers_key = index.is_unique && index.columns == primary_key;
            let single_unique = index.is_unique && index.columns.len() == 1;
            !index.columns.is_empty() && !covers_key && !single_unique
        })
    }
}

/// Source of introspected tables.
pub trait Introspect {
    /// Error reading the database description.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the tables in a stable order.
    fn introspect(&self) -> Result<Vec<IntrospectedTable>, Self::Error>;
}

/// Builds a migration that creates the tables only where missing.
///
/// The down section drops the tables in reverse order.
#[must_use]
pub fn baseline_migration(tables: &[IntrospectedTable]) -> String {
    let mut up = vec![goose::wrap_statement(
        "-- Baseline migration from existing database\n\
         -- All tables and indexes use conditional creation (IF NOT EXISTS)",
        None,
    )];
    for table in tables {
        up.push(goose::wrap_statement(&create_table_if_missing(table), None));
        for index in table.secondary_indexes() {
            let unique = if index.is_unique { "UNIQUE " } else { "" };
            up.push(goose::wrap_statement(
                &format!(
                    "CREATE {unique}INDEX IF NOT EXISTS {} ON {}({});",
                    index.name,
                    table.name,
                    index.columns.join(", ")
                ),
                None,
            ));
        }
    }

    let down: Vec<String> = tables
        .iter()
        .rev()
        .map(|t| goose::wrap_statement(&format!("DROP TABLE IF EXISTS {};", t.name), None))
        .collect();

    debug!(tables = tables.len(), "Generated baseline migration");
    goose::compose_migration(&up.join("\n\n"), &down.join("\n\n"))
}

fn create_table_if_missing(table: &IntrospectedTable) -> String {
    let primary_key = table.primary_key();
    let composite = primary_key.len() > 1;

    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut sql = format!("{} {}", column.name, column_sql_type(column));
            if column.is_primary_key && !composite {
                sql.push_str(" PRIMARY KEY");
            } else if !column.is_nullable {
                sql.push_str(" NOT NULL");
            }
            if table.is_unique_column(column) {
                sql.push_str(" UNIQUE");
            }
            if let Some(default) = column.default.as_deref().filter(|_| !column.is_auto_increment) {
                sql.push_str(" DEFAULT ");
                sql.push_str(default);
            }
            sql
        })
        .collect();
    if composite {
        lines.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n);",
        table.name,
        lines.join(",\n  ")
    )
}

/// Renders a schema file describing the tables.
#[must_use]
pub fn render_schema_file(tables: &[IntrospectedTable]) -> String {
    let mut out = String::from(
        "datasource db {\n  provider = \"postgresql\"\n  url      = env(\"DATABASE_URL\")\n}\n\n\
         generator client {\n  provider = \"oxide-schema\"\n  output   = \"./migrations\"\n}\n",
    );

    for table in tables {
        let primary_key = table.primary_key();
        let composite = primary_key.len() > 1;

        out.push_str(&format!("\nmodel {} {{\n", model_name(&table.name)));
        for column in &table.columns {
            let (declared, native) = declarative_type(&column.data_type);
            let optional = if column.is_nullable && !column.is_primary_key {
                "?"
            } else {
                ""
            };
            let mut attributes = Vec::new();
            if column.is_primary_key && !composite {
                attributes.push("@id".to_string());
            }
            if column.is_auto_increment {
                attributes.push("@default(autoincrement())".to_string());
            } else if let Some(default) = column.default.as_deref() {
                attributes.push(format!("@default({})", declarative_default(default, declared)));
            }
            if table.is_unique_column(column) {
                attributes.push("@unique".to_string());
            }
            if let Some(native) = native {
                attributes.push(render_native(&native));
            }
            let field = field_name(&column.name);
            if field != column.name {
                attributes.push(format!("@map(\"{}\")", column.name));
            }

            out.push_str(&format!("  {field} {declared}{optional}"));
            if !attributes.is_empty() {
                out.push(' ');
                out.push_str(&attributes.join(" "));
            }
            out.push('\n');
        }

        out.push('\n');
        if composite {
            let fields: Vec<String> = primary_key.iter().map(|c| field_name(c)).collect();
            out.push_str(&format!("  @@id([{}])\n", fields.join(", ")));
        }
        for index in table.secondary_indexes() {
            let kind = if index.is_unique { "unique" } else { "index" };
            let fields: Vec<String> = index.columns.iter().map(|c| field_name(c)).collect();
            out.push_str(&format!(
                "  @@{kind}([{}], map: \"{}\")\n",
                fields.join(", "),
                index.name
            ));
        }
        out.push_str(&format!("  @@map(\"{}\")\n}}\n", table.name));
    }
    out
}

/// Converts the tables to a [`Schema`] with SQL-origin field types, the
/// same shape the migration replayer produces.
#[must_use]
pub fn introspected_schema(tables: &[IntrospectedTable]) -> Schema {
    let mut schema = Schema::new();
    for table in tables {
        let primary_key = table.primary_key();
        let composite = primary_key.len() > 1;
        let mut model = Model::new(table.name.clone());

        for column in &table.columns {
            let mut field = Field::new(column.name.clone(), column_sql_type(column));
            field.is_optional = column.is_nullable && !column.is_primary_key;
            if column.is_primary_key && !composite {
                field = field.id();
            }
            if table.is_unique_column(column) {
                field = field.unique();
            }
            if let Some(default) = column.default.as_deref().filter(|_| !column.is_auto_increment) {
                field = field.default_value(default);
            }
            model = model.field(field);
        }

        if composite {
            model = model.attribute(ModelAttribute::with_fields("id", &primary_key));
        }
        for index in table.secondary_indexes() {
            let columns: Vec<&str> = index.columns.iter().map(String::as_str).collect();
            let kind = if index.is_unique { "unique" } else { "index" };
            model = model.attribute(
                ModelAttribute::with_fields(kind, &columns).arg(format!("map: \"{}\"", index.name)),
            );
        }
        schema = schema.model(model);
    }
    schema.datasource = Some(Datasource {
        name: "db".to_string(),
        provider: Some("postgresql".to_string()),
        url: None,
    });
    schema
}

/// SQL column type; autoincrement integers become the serial types.
fn column_sql_type(column: &IntrospectedColumn) -> String {
    let sql = sql_type(&column.data_type);
    if column.is_auto_increment {
        match sql.as_str() {
            "INTEGER" => return "SERIAL".to_string(),
            "BIGINT" => return "BIGSERIAL".to_string(),
            _ => {}
        }
    }
    sql
}

/// Splits `character varying(255)` into `("character varying", "255")`.
fn split_type(data_type: &str) -> (String, Option<String>) {
    let lower = data_type.trim().to_lowercase();
    match lower.split_once('(') {
        Some((base, rest)) => {
            let params = rest.trim_end_matches(')').trim();
            (
                base.trim().to_string(),
                (!params.is_empty()).then(|| params.to_string()),
            )
        }
        None => (lower, None),
    }
}

fn sql_type(data_type: &str) -> String {
    let (base, params) = split_type(data_type);
    let name = match base.as_str() {
        "integer" | "int" | "int4" => "INTEGER",
        "bigint" | "int8" => "BIGINT",
        "smallint" | "int2" => "SMALLINT",
        "character varying" | "varchar" => "VARCHAR",
        "character" | "char" | "bpchar" => "CHAR",
        "boolean" | "bool" => "BOOLEAN",
        "timestamp" | "timestamp without time zone" => "TIMESTAMP",
        "timestamptz" | "timestamp with time zone" => "TIMESTAMPTZ",
        "real" | "float4" => "REAL",
        "double precision" | "float8" => "DOUBLE PRECISION",
        "numeric" | "decimal" => "DECIMAL",
        _ => return data_type.trim().to_uppercase(),
    };
    match params {
        Some(params) if name != "TIMESTAMP" && name != "TIMESTAMPTZ" => {
            format!("{name}({params})")
        }
        _ => name.to_string(),
    }
}

/// Declarative type plus an optional `@db.*` override that preserves the
/// physical type.
fn declarative_type(data_type: &str) -> (&'static str, Option<FieldAttribute>) {
    let (base, params) = split_type(data_type);
    let native = |name: &str| {
        let attr = FieldAttribute::new(format!("db.{name}"));
        Some(match &params {
            Some(params) => crate::parser::split_top_level(params, ',')
                .into_iter()
                .fold(attr, |attr, arg| attr.arg(arg)),
            None => attr,
        })
    };
    match base.as_str() {
        "integer" | "int" | "int4" | "serial" | "serial4" => ("Int", None),
        "bigint" | "int8" | "bigserial" | "serial8" => ("BigInt", None),
        "smallint" | "int2" => ("Int", native("SmallInt")),
        "text" => ("String", None),
        "character varying" | "varchar" => ("String", native("VarChar")),
        "character" | "char" | "bpchar" => ("String", native("Char")),
        "boolean" | "bool" => ("Boolean", None),
        "timestamp" | "timestamp without time zone" => ("DateTime", None),
        "timestamptz" | "timestamp with time zone" => {
            ("DateTime", Some(FieldAttribute::new("db.Timestamptz")))
        }
        "date" => ("DateTime", Some(FieldAttribute::new("db.Date"))),
        "numeric" | "decimal" => ("Decimal", params.as_ref().and_then(|_| native("Decimal"))),
        "real" | "float4" => ("Float", Some(FieldAttribute::new("db.Real"))),
        "double precision" | "float8" => ("Float", None),
        "json" => ("Json", Some(FieldAttribute::new("db.Json"))),
        "jsonb" => ("Json", None),
        "bytea" => ("Bytes", None),
        "uuid" => ("String", Some(FieldAttribute::new("db.Uuid"))),
        _ => ("String", None),
    }
}

fn render_native(attr: &FieldAttribute) -> String {
    if attr.args.is_empty() {
        format!("@{}", attr.name)
    } else {
        format!("@{}({})", attr.name, attr.args.join(", "))
    }
}

/// Translates a SQL default to its declarative spelling.
fn declarative_default(sql: &str, declared: &str) -> String {
    let trimmed = sql.trim();
    let lower = trimmed.to_lowercase();
    if matches!(lower.as_str(), "now()" | "current_timestamp" | "current_timestamp()") {
        return "now()".to_string();
    }
    if lower == "gen_random_uuid()" {
        return "uuid()".to_string();
    }
    if lower == "true" || lower == "false" || trimmed.parse::<f64>().is_ok() {
        return lower;
    }
    if let Some(literal) = string_literal(trimmed) {
        return if declared == "String" {
            format!("\"{}\"", literal.replace('"', "\\\""))
        } else {
            literal
        };
    }
    format!("dbgenerated(\"{}\")", trimmed.replace('"', "\\\""))
}

/// Value of `'text'` or `'text'::type`.
fn string_literal(sql: &str) -> Option<String> {
    let body = sql.strip_prefix('\'')?;
    let end = body.rfind('\'')?;
    let rest = &body[end + 1..];
    (rest.is_empty() || rest.starts_with("::")).then(|| body[..end].replace("''", "'"))
}

/// `user_accounts` becomes `UserAccount`.
fn model_name(table: &str) -> String {
    singularize(
        &table
            .split('_')
            .map(capitalize)
            .collect::<String>(),
    )
}

/// `created_at` becomes `createdAt`.
fn field_name(column: &str) -> String {
    let mut parts = column.split('_');
    let first = parts.next().unwrap_or_default().to_string();
    parts.fold(first, |mut name, part| {
        name.push_str(&capitalize(part));
        name
    })
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix("ses") {
        format!("{stem}s")
    } else if name.ends_with('s') && !name.ends_with("ss") {
        name[..name.len() - 1].to_string()
    } else {
        name.to_string()
    }
}
