//! CREATE TABLE, CREATE TYPE and index rendering.

use crate::model::{Enum, Field, Model, Schema};
use crate::relation::unquote;
use crate::types::{CanonicalType, canonical_type, is_serial, sql_type_for_field};

use super::Statement;

/// Renders table-level DDL, resolving relations and enum types against a
/// schema.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableRenderer<'a> {
    schema: &'a Schema,
}

impl<'a> TableRenderer<'a> {
    pub(crate) const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// CREATE TABLE followed by its unique and regular indexes.
    pub(crate) fn create_table(&self, model: &Model) -> Vec<Statement> {
        let mut statements = vec![Statement::plain(self.create_table_sql(model))];
        statements.extend(self.unique_indexes(model).into_iter().map(Statement::plain));
        statements.extend(self.indexes(model).into_iter().map(Statement::plain));
        statements
    }

    fn create_table_sql(&self, model: &Model) -> String {
        let composite = model.composite_key();
        let mut lines: Vec<String> = Vec::new();
        let mut primary_key: Vec<String> = Vec::new();

        for field in model.fields.iter().filter(|f| self.schema.materializes(f)) {
            let inline_pk = composite.is_none() && field.is_id() && serial_type(field).is_some();
            if field.is_id() && !inline_pk {
                primary_key.push(field.column_name.clone());
            }
            lines.push(self.column_definition(field, inline_pk));
        }

        if let Some(key) = &composite {
            primary_key = model.columns_for(key);
        }
        if !primary_key.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
        }
        lines.extend(self.foreign_keys(model));

        format!(
            "CREATE TABLE {} (\n  {}\n);",
            model.table_name,
            lines.join(",\n  ")
        )
    }

    /// One column definition.
    ///
    /// With `inline_pk`, a serial column renders as `col SERIAL PRIMARY KEY`.
    pub(crate) fn column_definition(&self, field: &Field, inline_pk: bool) -> String {
        let serial = serial_type(field);
        if inline_pk {
            if let Some(serial) = &serial {
                return format!("{} {serial} PRIMARY KEY", field.column_name);
            }
        }

        let mut sql = format!(
            "{} {}",
            field.column_name,
            serial.unwrap_or_else(|| sql_type_for_field(field))
        );
        if let Some(default) = self.default_clause(field) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        if !field.is_optional {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    /// Renders the `@default(...)` expression as SQL.
    pub(crate) fn default_clause(&self, field: &Field) -> Option<String> {
        let raw = field.default_expr()?.trim();
        match raw {
            // Handled by SERIAL, or generated client-side.
            "autoincrement()" | "cuid()" => return None,
            "now()" => return Some("CURRENT_TIMESTAMP".to_string()),
            "uuid()" => return Some("gen_random_uuid()".to_string()),
            _ => {}
        }
        if let Some(inner) = raw
            .strip_prefix("dbgenerated(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Some(unquote(inner).to_string());
        }
        if raw.starts_with('"') {
            return Some(quote_literal(unquote(raw)));
        }
        if raw.starts_with('\'') {
            return Some(raw.to_string());
        }
        if raw.eq_ignore_ascii_case("true") {
            return Some("TRUE".to_string());
        }
        if raw.eq_ignore_ascii_case("false") {
            return Some("FALSE".to_string());
        }

        let ty = canonical_type(field);
        let is_enum = self.schema.get_enum(&field.field_type).is_some();
        if ty.is_textual() || (is_enum && is_identifier(raw)) {
            Some(quote_literal(raw))
        } else {
            Some(raw.to_string())
        }
    }

    /// `CREATE UNIQUE INDEX` statements for `@unique` and `@@unique`.
    pub(crate) fn unique_indexes(&self, model: &Model) -> Vec<String> {
        let table = &model.table_name;
        let mut sql: Vec<String> = model
            .fields
            .iter()
            .filter(|f| f.is_unique() && self.schema.materializes(f))
            .map(|f| unique_index(table, &[f.column_name.clone()], None))
            .collect();
        for attr in model.attributes_named("unique") {
            let columns = model.columns_for(&attr.field_names());
            if !columns.is_empty() {
                let name = attr.named_arg("map").or_else(|| attr.named_arg("name"));
                sql.push(unique_index(table, &columns, name.map(unquote)));
            }
        }
        sql
    }

    /// `CREATE INDEX` statements for `@@index`.
    pub(crate) fn indexes(&self, model: &Model) -> Vec<String> {
        let table = &model.table_name;
        model
            .attributes_named("index")
            .filter_map(|attr| {
                let columns = model.columns_for(&attr.field_names());
                if columns.is_empty() {
                    return None;
                }
                let name = attr
                    .named_arg("map")
                    .or_else(|| attr.named_arg("name"))
                    .map_or_else(
                        || format!("idx_{table}_{}", columns.join("_")),
                        |n| unquote(n).to_string(),
                    );
                Some(format!(
                    "CREATE INDEX {name} ON {table}({});",
                    columns.join(", ")
                ))
            })
            .collect()
    }

    /// `CONSTRAINT fk_...` clauses for the owning side of each relation.
    fn foreign_keys(&self, model: &Model) -> Vec<String> {
        model
            .fields
            .iter()
            .filter_map(|field| {
                let relation = field.relation()?;
                if !relation.is_owning_side() {
                    return None;
                }
                let local = model.columns_for(&relation.fields);
                let referenced_fields = relation.referenced_fields();
                let (table, columns) = match self.schema.get_model(&field.field_type) {
                    Some(target) => (
                        target.table_name.clone(),
                        target.columns_for(&referenced_fields),
                    ),
                    None => (naive_table_name(&field.field_type), referenced_fields),
                };

                let mut sql = format!(
                    "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {table}({})",
                    model.table_name,
                    local.join("_"),
                    local.join(", "),
                    columns.join(", ")
                );
                if let Some(action) = &relation.on_delete {
                    sql.push_str(" ON DELETE ");
                    sql.push_str(action.to_sql());
                }
                if let Some(action) = &relation.on_update {
                    sql.push_str(" ON UPDATE ");
                    sql.push_str(action.to_sql());
                }
                Some(sql)
            })
            .collect()
    }

    /// Physical tables this model references through foreign keys.
    pub(crate) fn referenced_tables(&self, model: &Model) -> Vec<String> {
        model
            .fields
            .iter()
            .filter_map(|field| {
                let relation = field.relation()?;
                relation.is_owning_side().then(|| {
                    self.schema
                        .get_model(&field.field_type)
                        .map_or_else(|| naive_table_name(&field.field_type), |m| m.table_name.clone())
                })
            })
            .collect()
    }
}

/// `CREATE TYPE ... AS ENUM (...)`.
pub(crate) fn create_enum(enumeration: &Enum) -> String {
    let values: Vec<String> = enumeration.values.iter().map(|v| quote_literal(v)).collect();
    format!(
        "CREATE TYPE {} AS ENUM ({});",
        enumeration.name,
        values.join(", ")
    )
}

pub(crate) fn drop_enum(enumeration: &Enum) -> String {
    format!("DROP TYPE IF EXISTS {};", enumeration.name)
}

pub(crate) fn drop_table(model: &Model) -> String {
    format!("DROP TABLE IF EXISTS {};", model.table_name)
}

fn unique_index(table: &str, columns: &[String], name: Option<&str>) -> String {
    let name = name.map_or_else(
        || format!("idx_uniq_{table}_{}", columns.join("_")),
        str::to_string,
    );
    format!(
        "CREATE UNIQUE INDEX {name} ON {table}({});",
        columns.join(", ")
    )
}

/// `SERIAL`/`BIGSERIAL` for autoincrement integers and SQL-origin serial
/// columns.
fn serial_type(field: &Field) -> Option<String> {
    if is_serial(&field.field_type) {
        return Some(field.field_type.trim().to_uppercase());
    }
    if !field.is_autoincrement() {
        return None;
    }
    match canonical_type(field) {
        CanonicalType::Integer => Some("SERIAL".to_string()),
        CanonicalType::BigInt => Some("BIGSERIAL".to_string()),
        _ => None,
    }
}

/// Table name for a model that is not in the lookup schema.
fn naive_table_name(model_name: &str) -> String {
    let lower = model_name.to_lowercase();
    if lower.ends_with('s') {
        lower
    } else {
        format!("{lower}s")
    }
}

pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn is_identifier(value: &str) -> bool {
    value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldAttribute, ModelAttribute};

    fn organizations() -> Model {
        Model::new("Organization")
            .map_to("organizations")
            .field(Field::new("id", "Int").id().default_value("autoincrement()"))
            .field(Field::new("name", "String"))
            .field(Field::new("slug", "String").unique())
            .field(
                Field::new("createdAt", "DateTime")
                    .map_to("created_at")
                    .default_value("now()"),
            )
    }

    #[test]
    fn test_create_table_layout() {
        let schema = Schema::new().model(organizations());
        let renderer = TableRenderer::new(&schema);
        let statements = renderer.create_table(&schema.models[0]);

        assert_eq!(
            statements[0].sql,
            "CREATE TABLE organizations (\n  id SERIAL PRIMARY KEY,\n  name TEXT NOT NULL,\n  \
             slug TEXT NOT NULL,\n  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL\n);"
        );
        assert_eq!(
            statements[1].sql,
            "CREATE UNIQUE INDEX idx_uniq_organizations_slug ON organizations(slug);"
        );
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_non_serial_primary_key_is_trailing() {
        let model = Model::new("sessions")
            .field(Field::new("token", "String").id())
            .field(Field::new("data", "Json").optional());
        let schema = Schema::new().model(model);
        let sql = TableRenderer::new(&schema).create_table_sql(&schema.models[0]);
        assert!(sql.contains("token TEXT NOT NULL,\n  data JSONB,\n  PRIMARY KEY (token)"));
    }

    #[test]
    fn test_composite_key_and_indexes() {
        let model = Model::new("Membership")
            .map_to("memberships")
            .field(Field::new("userId", "Int").map_to("user_id"))
            .field(Field::new("teamId", "Int").map_to("team_id"))
            .field(Field::new("role", "String"))
            .attribute(ModelAttribute::with_fields("id", &["userId", "teamId"]))
            .attribute(ModelAttribute::with_fields("index", &["role"]))
            .attribute(ModelAttribute::with_fields("unique", &["teamId", "role"]));
        let schema = Schema::new().model(model);
        let renderer = TableRenderer::new(&schema);
        let model = &schema.models[0];

        assert!(renderer
            .create_table_sql(model)
            .contains("PRIMARY KEY (user_id, team_id)"));
        assert_eq!(
            renderer.unique_indexes(model),
            vec!["CREATE UNIQUE INDEX idx_uniq_memberships_team_id_role ON memberships(team_id, role);"]
        );
        assert_eq!(
            renderer.indexes(model),
            vec!["CREATE INDEX idx_memberships_role ON memberships(role);"]
        );
    }

    #[test]
    fn test_foreign_key_uses_mapped_table() {
        let post = Model::new("Post")
            .map_to("posts")
            .field(Field::new("id", "Int").id().default_value("autoincrement()"))
            .field(Field::new("authorId", "Int").map_to("author_id"))
            .field(
                Field::new("author", "User").attribute(
                    FieldAttribute::new("relation")
                        .arg("fields: [authorId]")
                        .arg("references: [id]")
                        .arg("onDelete: Cascade"),
                ),
            );
        let schema = Schema::new()
            .model(Model::new("User").map_to("people").field(Field::new("id", "Int").id()))
            .model(post);
        let renderer = TableRenderer::new(&schema);
        let sql = renderer.create_table_sql(&schema.models[1]);

        assert!(sql.contains(
            "CONSTRAINT fk_posts_author_id FOREIGN KEY (author_id) REFERENCES people(id) ON DELETE CASCADE"
        ));
        assert!(!sql.contains("author User"));
        assert_eq!(renderer.referenced_tables(&schema.models[1]), vec!["people"]);
    }

    #[test]
    fn test_foreign_key_falls_back_to_plural() {
        let model = Model::new("Post").field(Field::new("authorId", "Int")).field(
            Field::new("author", "Author")
                .attribute(FieldAttribute::new("relation").arg("fields: [authorId]")),
        );
        let schema = Schema::new();
        let renderer = TableRenderer::new(&schema);
        assert_eq!(renderer.referenced_tables(&model), vec!["authors"]);
    }

    #[test]
    fn test_default_rendering() {
        let schema = Schema::new().enumeration(Enum::new("Status", ["ACTIVE", "INACTIVE"]));
        let renderer = TableRenderer::new(&schema);
        let render = |field: Field| renderer.default_clause(&field);

        assert_eq!(render(Field::new("a", "String").default_value("\"it's\"")), Some("'it''s'".into()));
        assert_eq!(render(Field::new("a", "Boolean").default_value("true")), Some("TRUE".into()));
        assert_eq!(render(Field::new("a", "Int").default_value("0")), Some("0".into()));
        assert_eq!(render(Field::new("a", "Int").default_value("autoincrement()")), None);
        assert_eq!(render(Field::new("a", "String").default_value("uuid()")), Some("gen_random_uuid()".into()));
        assert_eq!(render(Field::new("a", "String").default_value("cuid()")), None);
        assert_eq!(render(Field::new("a", "Status").default_value("ACTIVE")), Some("'ACTIVE'".into()));
        assert_eq!(
            render(Field::new("a", "Int").default_value("dbgenerated(\"nextval('seq')\")")),
            Some("nextval('seq')".into())
        );
        assert_eq!(render(Field::new("a", "TEXT").default_value("'x'::text")), Some("'x'::text".into()));
    }

    #[test]
    fn test_bigint_autoincrement_is_bigserial() {
        let schema = Schema::new();
        let renderer = TableRenderer::new(&schema);
        let field = Field::new("id", "BigInt").id().default_value("autoincrement()");
        assert_eq!(renderer.column_definition(&field, true), "id BIGSERIAL PRIMARY KEY");
    }

    #[test]
    fn test_replayed_serial_column_stays_inline() {
        let schema = Schema::new();
        let renderer = TableRenderer::new(&schema);
        let field = Field::new("id", "SERIAL").id();
        assert_eq!(renderer.column_definition(&field, true), "id SERIAL PRIMARY KEY");
    }

    #[test]
    fn test_create_enum() {
        let status = Enum::new("UserStatus", ["ACTIVE", "INACTIVE", "PENDING"]);
        assert_eq!(
            create_enum(&status),
            "CREATE TYPE UserStatus AS ENUM ('ACTIVE', 'INACTIVE', 'PENDING');"
        );
        assert_eq!(drop_enum(&status), "DROP TYPE IF EXISTS UserStatus;");
    }
}
