//! Relation descriptors.
//!
//! A relation is never held as a live reference to another model. The
//! generator resolves the referenced table by name when it renders the
//! foreign key.

use serde::{Deserialize, Serialize};

use crate::model::FieldAttribute;

/// Referential action for `onDelete` / `onUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    /// Error if referencing rows exist.
    NoAction,
    /// Same as `NoAction` but checked immediately.
    Restrict,
    /// Cascade to referencing rows.
    Cascade,
    /// Set the referencing column to NULL.
    SetNull,
    /// Set the referencing column to its default.
    SetDefault,
    /// Anything else, rendered upper-cased.
    Other(String),
}

impl ReferentialAction {
    /// Parses a declarative action name such as `Cascade` or `SetNull`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().trim_matches('"') {
            "NoAction" => Self::NoAction,
            "Restrict" => Self::Restrict,
            "Cascade" => Self::Cascade,
            "SetNull" => Self::SetNull,
            "SetDefault" => Self::SetDefault,
            other => Self::Other(other.to_uppercase()),
        }
    }

    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Other(sql) => sql,
        }
    }
}

/// Parsed `@relation(...)` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Optional relation name (first positional string or `name:`).
    pub name: Option<String>,
    /// Local field names holding the foreign key.
    pub fields: Vec<String>,
    /// Referenced field names on the other model.
    pub references: Vec<String>,
    /// `onDelete` action.
    pub on_delete: Option<ReferentialAction>,
    /// `onUpdate` action.
    pub on_update: Option<ReferentialAction>,
}

impl Relation {
    /// Reads a relation from its attribute arguments.
    #[must_use]
    pub fn from_attribute(attr: &FieldAttribute) -> Self {
        let name = attr
            .named_arg("name")
            .or_else(|| attr.positional_arg())
            .map(|n| unquote(n).to_string());

        Self {
            name,
            fields: attr.named_arg("fields").map(parse_list).unwrap_or_default(),
            references: attr
                .named_arg("references")
                .map(parse_list)
                .unwrap_or_default(),
            on_delete: attr.named_arg("onDelete").map(ReferentialAction::parse),
            on_update: attr.named_arg("onUpdate").map(ReferentialAction::parse),
        }
    }

    /// Returns `true` if this side holds the foreign key column(s).
    #[must_use]
    pub fn is_owning_side(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Referenced field names, defaulting to `id`.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<String> {
        if self.references.is_empty() {
            vec!["id".to_string()]
        } else {
            self.references.clone()
        }
    }
}

/// Parses a bracketed list such as `[a, "b", c(sort: Desc)]` into names.
///
/// Entry modifiers in parentheses are dropped. A value without brackets is
/// treated as a single-element list.
#[must_use]
pub fn parse_list(value: &str) -> Vec<String> {
    let inner = value.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    crate::parser::split_top_level(inner, ',')
        .into_iter()
        .map(|entry| {
            let entry = entry.split('(').next().unwrap_or_default();
            unquote(entry.trim()).to_string()
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Strips one level of matching double or single quotes.
#[must_use]
pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_from_attribute() {
        let attr = FieldAttribute::new("relation")
            .arg("fields: [organizationId]")
            .arg("references: [id]")
            .arg("onDelete: Cascade");
        let relation = Relation::from_attribute(&attr);

        assert_eq!(relation.fields, vec!["organizationId"]);
        assert_eq!(relation.references, vec!["id"]);
        assert_eq!(relation.on_delete, Some(ReferentialAction::Cascade));
        assert!(relation.is_owning_side());
        assert!(relation.name.is_none());
    }

    #[test]
    fn test_back_relation_is_not_owning() {
        let attr = FieldAttribute::new("relation").arg("\"Authored\"");
        let relation = Relation::from_attribute(&attr);

        assert_eq!(relation.name.as_deref(), Some("Authored"));
        assert!(!relation.is_owning_side());
        assert_eq!(relation.referenced_fields(), vec!["id"]);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("[a, b]"), vec!["a", "b"]);
        assert_eq!(parse_list("[ \"a\" ]"), vec!["a"]);
        assert_eq!(parse_list("[createdAt(sort: Desc), id]"), vec!["createdAt", "id"]);
        assert_eq!(parse_list("single"), vec!["single"]);
        assert!(parse_list("[]").is_empty());
    }

    #[test]
    fn test_referential_action_sql() {
        assert_eq!(ReferentialAction::parse("SetNull").to_sql(), "SET NULL");
        assert_eq!(ReferentialAction::parse("NoAction").to_sql(), "NO ACTION");
        assert_eq!(ReferentialAction::parse("cascade").to_sql(), "CASCADE");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"users\""), "users");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("plain"), "plain");
    }
}
