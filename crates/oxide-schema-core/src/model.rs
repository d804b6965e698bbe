//! Schema model types.
//!
//! These types describe tables, columns and enumerated types. Both the
//! declarative schema parser (what the code expects) and the migration
//! replayer (what previous migrations created) produce a [`Schema`], which
//! the differ then compares by physical table and column names.

use serde::{Deserialize, Serialize};

use crate::relation::{Relation, parse_list};

/// A field-level directive such as `@id`, `@default(now())` or
/// `@db.VarChar(255)`.
///
/// Arguments are kept as raw top-level strings, e.g. the relation
/// `@relation(fields: [a], references: [id])` carries the two arguments
/// `fields: [a]` and `references: [id]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttribute {
    /// Attribute name without the leading `@`.
    pub name: String,
    /// Raw arguments, split on top-level commas.
    pub args: Vec<String>,
}

impl FieldAttribute {
    /// Creates an attribute without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Adds a raw argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Returns the value of a `key: value` argument.
    #[must_use]
    pub fn named_arg(&self, key: &str) -> Option<&str> {
        named_arg(&self.args, key)
    }

    /// Returns the first argument that is not of the `key: value` form.
    #[must_use]
    pub fn positional_arg(&self) -> Option<&str> {
        positional_arg(&self.args)
    }

    /// Returns `true` for the `@db.*` native type family.
    #[must_use]
    pub fn is_native_type(&self) -> bool {
        self.name.starts_with("db.")
    }
}

/// A block-level directive such as `@@id([a, b])` or `@@map("users")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAttribute {
    /// Attribute name without the leading `@@`.
    pub name: String,
    /// Raw arguments, split on top-level commas.
    pub args: Vec<String>,
}

impl ModelAttribute {
    /// Creates an attribute without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Adds a raw argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Creates a list-valued attribute, e.g. `@@id([a, b])`.
    #[must_use]
    pub fn with_fields(name: impl Into<String>, fields: &[&str]) -> Self {
        Self::new(name).arg(format!("[{}]", fields.join(", ")))
    }

    /// Returns the value of a `key: value` argument.
    #[must_use]
    pub fn named_arg(&self, key: &str) -> Option<&str> {
        named_arg(&self.args, key)
    }

    /// Returns the field names this attribute lists.
    ///
    /// Accepts both `@@unique([a, b])` and `@@unique(fields: [a, b])`.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.named_arg("fields")
            .or_else(|| positional_arg(&self.args))
            .map(parse_list)
            .unwrap_or_default()
    }
}

/// One column, or a relation that has no backing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Declarative name.
    pub name: String,
    /// Physical column name. Defaults to `name`.
    pub column_name: String,
    /// Declarative type (`String`, `Int`, a model or enum name) or, for
    /// fields rebuilt from SQL, the SQL type as written.
    pub field_type: String,
    /// Whether the column accepts NULL.
    pub is_optional: bool,
    /// Relation list. Never materialized as a column.
    pub is_array: bool,
    /// Field-level directives in declaration order.
    pub attributes: Vec<FieldAttribute>,
}

impl Field {
    /// Creates a required scalar field whose column name equals its name.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            field_type: field_type.into(),
            is_optional: false,
            is_array: false,
            attributes: Vec::new(),
        }
    }

    /// Marks the field as nullable.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Marks the field as a relation list.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Overrides the physical column name.
    #[must_use]
    pub fn map_to(mut self, column: impl Into<String>) -> Self {
        self.column_name = column.into();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: FieldAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Shorthand for `@id`.
    #[must_use]
    pub fn id(self) -> Self {
        self.attribute(FieldAttribute::new("id"))
    }

    /// Shorthand for `@unique`.
    #[must_use]
    pub fn unique(self) -> Self {
        self.attribute(FieldAttribute::new("unique"))
    }

    /// Shorthand for `@default(<expr>)`.
    #[must_use]
    pub fn default_value(self, expr: impl Into<String>) -> Self {
        self.attribute(FieldAttribute::new("default").arg(expr))
    }

    /// Returns the first attribute with the given name.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&FieldAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns `true` if the field carries the named attribute.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Returns `true` for `@id`.
    #[must_use]
    pub fn is_id(&self) -> bool {
        self.has_attribute("id")
    }

    /// Returns `true` for `@unique`.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.has_attribute("unique")
    }

    /// Returns the raw `@default(...)` expression.
    #[must_use]
    pub fn default_expr(&self) -> Option<&str> {
        self.get_attribute("default")
            .and_then(|a| a.args.first())
            .map(String::as_str)
    }

    /// Returns `true` for `@default(autoincrement())`.
    #[must_use]
    pub fn is_autoincrement(&self) -> bool {
        self.default_expr() == Some("autoincrement()")
    }

    /// Returns the `@db.*` native type override, if any.
    #[must_use]
    pub fn native_type(&self) -> Option<&FieldAttribute> {
        self.attributes.iter().find(|a| a.is_native_type())
    }

    /// Returns the parsed `@relation(...)` descriptor.
    #[must_use]
    pub fn relation(&self) -> Option<Relation> {
        self.get_attribute("relation").map(Relation::from_attribute)
    }

    /// Returns `true` for relation lists and relation-attributed fields.
    ///
    /// Such fields never become columns; the owning side's relation is
    /// rendered as a foreign key constraint instead.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        self.is_array || self.has_attribute("relation")
    }
}

/// One table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Declarative name.
    pub name: String,
    /// Physical table name. Defaults to `name`.
    pub table_name: String,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Block-level directives.
    pub attributes: Vec<ModelAttribute>,
}

impl Model {
    /// Creates a model whose table name equals its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table_name: name.clone(),
            name,
            fields: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Overrides the physical table name.
    #[must_use]
    pub fn map_to(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a block-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: ModelAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Gets a field by declarative name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Gets a field by physical column name.
    #[must_use]
    pub fn get_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column_name == column)
    }

    /// Gets a mutable field by physical column name.
    #[must_use]
    pub fn get_column_mut(&mut self, column: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.column_name == column)
    }

    /// Returns all attributes with the given name.
    pub fn attributes_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ModelAttribute> + 'a {
        self.attributes.iter().filter(move |a| a.name == name)
    }

    /// Returns the field names of a composite `@@id([...])`, if present.
    #[must_use]
    pub fn composite_key(&self) -> Option<Vec<String>> {
        self.attributes_named("id")
            .next()
            .map(ModelAttribute::field_names)
            .filter(|names| !names.is_empty())
    }

    /// Resolves declarative field names to column names.
    ///
    /// Names that match no field are passed through unchanged.
    #[must_use]
    pub fn columns_for(&self, field_names: &[String]) -> Vec<String> {
        field_names
            .iter()
            .map(|name| {
                self.get_field(name)
                    .map_or_else(|| name.clone(), |f| f.column_name.clone())
            })
            .collect()
    }

    /// Returns `true` if a primary key is declared on a field or the block.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        self.composite_key().is_some() || self.fields.iter().any(Field::is_id)
    }
}

/// A declarative enum, rendered as a PostgreSQL enumerated type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    /// Type name.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<String>,
}

impl Enum {
    /// Creates an enum with the given values.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A `datasource` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    /// Block name, usually `db`.
    pub name: String,
    /// Unquoted `provider` value.
    pub provider: Option<String>,
    /// Raw `url` value, e.g. `env("DATABASE_URL")`.
    pub url: Option<String>,
}

/// A complete schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables.
    pub models: Vec<Model>,
    /// Enumerated types.
    pub enums: Vec<Enum>,
    /// Datasource declaration, if the source had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<Datasource>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model.
    #[must_use]
    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Adds an enum.
    #[must_use]
    pub fn enumeration(mut self, enumeration: Enum) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// Returns `true` if the schema declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.enums.is_empty()
    }

    /// Gets a model by declarative name.
    #[must_use]
    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Gets a model by physical table name.
    #[must_use]
    pub fn get_table(&self, table: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.table_name == table)
    }

    /// Gets a mutable model by physical table name.
    #[must_use]
    pub fn get_table_mut(&mut self, table: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.table_name == table)
    }

    /// Gets an enum by name.
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Returns the physical table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.table_name.as_str())
    }

    /// Returns `true` if the field is backed by a column in this schema.
    ///
    /// Relation lists, relation-attributed fields and fields whose type
    /// names another model are metadata only.
    #[must_use]
    pub fn materializes(&self, field: &Field) -> bool {
        !field.is_relation() && self.get_model(&field.field_type).is_none()
    }
}

fn named_arg<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter().find_map(|arg| {
        let (name, value) = arg.split_once(':')?;
        (name.trim() == key).then(|| value.trim())
    })
}

fn positional_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .map(|a| a.trim())
        .find(|a| !is_named(a))
}

/// `key: value`, where the key is a bare identifier. Guards against
/// treating `'a'::text` or `"x:y"` as named.
fn is_named(arg: &str) -> bool {
    arg.split_once(':').is_some_and(|(key, rest)| {
        let key = key.trim();
        !key.is_empty()
            && !rest.starts_with(':')
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}
