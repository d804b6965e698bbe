//! Structural checks on a parsed schema.
//!
//! Parsing is lenient; validation is where a schema file is rejected
//! before anything is generated from it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Model, Schema};

/// A structural problem in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationIssue {
    /// A model declares neither `@id` nor `@@id`.
    #[error("model {model} must have at least one @id field or @@id attribute")]
    MissingPrimaryKey {
        /// Model name.
        model: String,
    },

    /// Two models map to the same table.
    #[error("models {first} and {second} both map to table {table}")]
    DuplicateTable {
        /// Physical table name.
        table: String,
        /// First model.
        first: String,
        /// Second model.
        second: String,
    },

    /// Two fields of a model map to the same column.
    #[error("model {model} maps more than one field to column {column}")]
    DuplicateColumn {
        /// Model name.
        model: String,
        /// Physical column name.
        column: String,
    },

    /// A relation lists a local field that does not exist.
    #[error("relation {model}.{relation} references unknown field {field}")]
    UnknownRelationField {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
        /// The missing field.
        field: String,
    },

    /// `@@id`, `@@unique` or `@@index` lists a field that does not exist.
    #[error("@@{attribute} on model {model} references unknown field {field}")]
    UnknownAttributeField {
        /// Model name.
        model: String,
        /// Attribute name without `@@`.
        attribute: String,
        /// The missing field.
        field: String,
    },

    /// An enum has no values.
    #[error("enum {name} has no values")]
    EmptyEnum {
        /// Enum name.
        name: String,
    },

    /// The datasource provider is not PostgreSQL.
    #[error("unsupported datasource provider {provider}, only postgresql is supported")]
    UnsupportedProvider {
        /// Declared provider.
        provider: String,
    },
}

/// Checks a schema and returns every issue found, in declaration order.
#[must_use]
pub fn validate(schema: &Schema) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if let Some(provider) = schema
        .datasource
        .as_ref()
        .and_then(|d| d.provider.as_deref())
    {
        if !matches!(provider, "postgresql" | "postgres") {
            issues.push(ValidationIssue::UnsupportedProvider {
                provider: provider.to_string(),
            });
        }
    }

    let mut tables: Vec<(&str, &str)> = Vec::new();
    for model in &schema.models {
        if let Some((_, first)) = tables.iter().find(|(t, _)| *t == model.table_name) {
            issues.push(ValidationIssue::DuplicateTable {
                table: model.table_name.clone(),
                first: (*first).to_string(),
                second: model.name.clone(),
            });
        } else {
            tables.push((model.table_name.as_str(), model.name.as_str()));
        }
        validate_model(schema, model, &mut issues);
    }

    for enumeration in &schema.enums {
        if enumeration.values.is_empty() {
            issues.push(ValidationIssue::EmptyEnum {
                name: enumeration.name.clone(),
            });
        }
    }

    debug!(issues = issues.len(), "Validated schema");
    issues
}

fn validate_model(schema: &Schema, model: &Model, issues: &mut Vec<ValidationIssue>) {
    if !model.has_primary_key() {
        issues.push(ValidationIssue::MissingPrimaryKey {
            model: model.name.clone(),
        });
    }

    let mut columns = HashSet::new();
    for field in model.fields.iter().filter(|f| schema.materializes(f)) {
        if !columns.insert(field.column_name.as_str()) {
            issues.push(ValidationIssue::DuplicateColumn {
                model: model.name.clone(),
                column: field.column_name.clone(),
            });
        }
    }

    for field in &model.fields {
        let Some(relation) = field.relation() else {
            continue;
        };
        for name in relation.fields {
            if model.get_field(&name).is_none() {
                issues.push(ValidationIssue::UnknownRelationField {
                    model: model.name.clone(),
                    relation: field.name.clone(),
                    field: name,
                });
            }
        }
    }

    for attribute in model
        .attributes
        .iter()
        .filter(|a| matches!(a.name.as_str(), "id" | "unique" | "index"))
    {
        for name in attribute.field_names() {
            if model.get_field(&name).is_none() {
                issues.push(ValidationIssue::UnknownAttributeField {
                    model: model.name.clone(),
                    attribute: attribute.name.clone(),
                    field: name,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Datasource, Enum, Field, FieldAttribute, ModelAttribute};

    fn user() -> Model {
        Model::new("User")
            .map_to("users")
            .field(Field::new("id", "Int").id())
            .field(Field::new("email", "String"))
    }

    #[test]
    fn test_valid_schema() {
        let schema = Schema::new().model(user());
        assert!(validate(&schema).is_empty());
    }

    #[test]
    fn test_missing_primary_key() {
        let schema = Schema::new().model(Model::new("Log").field(Field::new("line", "String")));
        let issues = validate(&schema);
        assert!(matches!(
            issues.as_slice(),
            [ValidationIssue::MissingPrimaryKey { model }] if model == "Log"
        ));
        assert_eq!(
            issues[0].to_string(),
            "model Log must have at least one @id field or @@id attribute"
        );
    }

    #[test]
    fn test_composite_key_counts_as_primary_key() {
        let schema = Schema::new().model(
            Model::new("Membership")
                .field(Field::new("userId", "Int"))
                .field(Field::new("teamId", "Int"))
                .attribute(ModelAttribute::with_fields("id", &["userId", "teamId"])),
        );
        assert!(validate(&schema).is_empty());
    }

    #[test]
    fn test_duplicate_table_and_column() {
        let schema = Schema::new().model(user()).model(
            Model::new("Account")
                .map_to("users")
                .field(Field::new("id", "Int").id())
                .field(Field::new("mail", "String").map_to("id")),
        );
        let issues = validate(&schema);
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DuplicateTable { table, .. } if table == "users")));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DuplicateColumn { column, .. } if column == "id")));
    }

    #[test]
    fn test_unknown_fields_in_relation_and_attributes() {
        let post = Model::new("Post")
            .field(Field::new("id", "Int").id())
            .field(
                Field::new("author", "User").attribute(
                    FieldAttribute::new("relation")
                        .arg("fields: [authorId]")
                        .arg("references: [id]"),
                ),
            )
            .attribute(ModelAttribute::with_fields("index", &["title"]));
        let schema = Schema::new().model(user()).model(post);
        let issues = validate(&schema);

        assert_eq!(issues.len(), 2);
        assert!(matches!(
            &issues[0],
            ValidationIssue::UnknownRelationField { field, .. } if field == "authorId"
        ));
        assert!(matches!(
            &issues[1],
            ValidationIssue::UnknownAttributeField { attribute, field, .. }
                if attribute == "index" && field == "title"
        ));
    }

    #[test]
    fn test_empty_enum_and_provider() {
        let mut schema = Schema::new()
            .model(user())
            .enumeration(Enum::new("Nothing", Vec::<String>::new()));
        schema.datasource = Some(Datasource {
            name: "db".into(),
            provider: Some("mysql".into()),
            url: None,
        });
        let issues = validate(&schema);
        assert!(matches!(issues[0], ValidationIssue::UnsupportedProvider { .. }));
        assert!(matches!(issues[1], ValidationIssue::EmptyEnum { .. }));
    }
}
