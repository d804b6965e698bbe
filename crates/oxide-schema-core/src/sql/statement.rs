//! Restricted DDL grammar.
//!
//! Only statements that change table, column, enum or index structure are
//! recognized. Everything else parses to [`SqlStatement::Unknown`], which
//! replay skips.

use super::scanner::{Token, render, render_type, split_top_level_commas};

/// Words that end a column's type and start its constraints.
const COLUMN_CONSTRAINT_WORDS: &[&str] = &[
    "NOT",
    "NULL",
    "PRIMARY",
    "UNIQUE",
    "DEFAULT",
    "REFERENCES",
    "CHECK",
    "CONSTRAINT",
    "COLLATE",
    "GENERATED",
];

/// Words that open a table-level constraint inside `CREATE TABLE (...)`.
const TABLE_CONSTRAINT_WORDS: &[&str] =
    &["PRIMARY", "UNIQUE", "CONSTRAINT", "FOREIGN", "CHECK", "EXCLUDE"];

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name, unquoted.
    pub name: String,
    /// Type as written, with normalized spacing, e.g. `DECIMAL(10, 2)`.
    pub data_type: String,
    /// `NOT NULL` present.
    pub not_null: bool,
    /// Inline `PRIMARY KEY`.
    pub primary_key: bool,
    /// Inline `UNIQUE`.
    pub unique: bool,
    /// `DEFAULT` expression, rendered back to SQL.
    pub default: Option<String>,
}

impl ColumnDef {
    /// Returns `true` unless `NOT NULL` or `PRIMARY KEY` is present.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        !(self.not_null || self.primary_key)
    }
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    /// `PRIMARY KEY (a, b)`.
    PrimaryKey(Vec<String>),
    /// `UNIQUE (a, b)`.
    Unique(Vec<String>),
    /// Foreign keys, checks and anything else.
    Other,
}

/// One action of an `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterAction {
    /// `ADD [COLUMN] [IF NOT EXISTS] <def>`.
    AddColumn { column: ColumnDef, if_not_exists: bool },
    /// `DROP [COLUMN] [IF EXISTS] <name>`.
    DropColumn { name: String, if_exists: bool },
    /// `ALTER [COLUMN] <name> [SET DATA] TYPE <type> [USING ...]`.
    AlterType { column: String, data_type: String },
    /// `ALTER [COLUMN] <name> SET NOT NULL`.
    SetNotNull(String),
    /// `ALTER [COLUMN] <name> DROP NOT NULL`.
    DropNotNull(String),
    /// `ALTER [COLUMN] <name> SET DEFAULT <expr>`.
    SetDefault { column: String, expr: String },
    /// `ALTER [COLUMN] <name> DROP DEFAULT`.
    DropDefault(String),
    /// `RENAME [COLUMN] <from> TO <to>`.
    RenameColumn { from: String, to: String },
    /// `RENAME TO <name>`.
    RenameTable(String),
    /// `ADD [CONSTRAINT name] PRIMARY KEY | UNIQUE | ...`.
    AddConstraint(TableConstraint),
    /// Anything else, rendered.
    Other(String),
}

/// A parsed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlStatement {
    /// `CREATE TABLE [IF NOT EXISTS] name (...)`.
    CreateTable {
        name: String,
        if_not_exists: bool,
        columns: Vec<ColumnDef>,
        constraints: Vec<TableConstraint>,
    },
    /// `ALTER TABLE [IF EXISTS] [ONLY] name action, ...`.
    AlterTable {
        name: String,
        actions: Vec<AlterAction>,
    },
    /// `DROP TABLE [IF EXISTS] a, b [CASCADE]`.
    DropTable { names: Vec<String>, if_exists: bool },
    /// `CREATE TYPE name AS ENUM ('a', 'b')`.
    CreateEnum { name: String, values: Vec<String> },
    /// `ALTER TYPE name ADD VALUE [IF NOT EXISTS] 'v' [BEFORE|AFTER 'w']`.
    AddEnumValue {
        name: String,
        value: String,
        position: Option<EnumValuePosition>,
    },
    /// `DROP TYPE [IF EXISTS] a, b [CASCADE]`.
    DropType { names: Vec<String>, if_exists: bool },
    /// `CREATE [UNIQUE] INDEX [CONCURRENTLY] [IF NOT EXISTS] [name] ON table (cols)`.
    CreateIndex {
        name: Option<String>,
        table: String,
        columns: Vec<String>,
        unique: bool,
    },
    /// `DROP INDEX ...`. Recognized so it is not reported, but not replayed.
    DropIndex,
    /// Anything outside the grammar, rendered back to SQL.
    Unknown(String),
}

/// Placement of a new enum value relative to an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValuePosition {
    /// `BEFORE 'value'`.
    Before(String),
    /// `AFTER 'value'`.
    After(String),
}

/// Cursor over a statement's tokens.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Consumes the keyword sequence if it matches entirely.
    fn eat(&mut self, keywords: &[&str]) -> bool {
        let matches = keywords.iter().enumerate().all(|(i, kw)| {
            self.tokens
                .get(self.pos + i)
                .is_some_and(|t| t.is_keyword(kw))
        });
        if matches {
            self.pos += keywords.len();
        }
        matches
    }

    fn ident(&mut self) -> Option<String> {
        let name = self.peek()?.ident()?.to_string();
        self.pos += 1;
        Some(name)
    }

    fn string(&mut self) -> Option<String> {
        match self.peek()? {
            Token::Str(s) => {
                self.pos += 1;
                Some(s.clone())
            }
            _ => None,
        }
    }

    /// Consumes a parenthesized group and returns its inner tokens.
    fn group(&mut self) -> Option<&'a [Token]> {
        if self.peek() != Some(&Token::LParen) {
            return None;
        }
        let start = self.pos + 1;
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&self.tokens[start..self.pos - 1]);
                    }
                }
                _ => {}
            }
        }
        Some(&self.tokens[start..])
    }

    fn rest(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    const fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

/// Parses one statement's tokens.
#[must_use]
pub fn parse_statement(tokens: &[Token]) -> SqlStatement {
    let mut cursor = Cursor::new(tokens);
    let parsed = if cursor.eat(&["CREATE", "TABLE"]) {
        parse_create_table(&mut cursor)
    } else if cursor.eat(&["ALTER", "TABLE"]) {
        parse_alter_table(&mut cursor)
    } else if cursor.eat(&["DROP", "TABLE"]) {
        parse_drop(&mut cursor).map(|(names, if_exists)| SqlStatement::DropTable { names, if_exists })
    } else if cursor.eat(&["CREATE", "TYPE"]) {
        parse_create_enum(&mut cursor)
    } else if cursor.eat(&["ALTER", "TYPE"]) {
        parse_alter_type(&mut cursor)
    } else if cursor.eat(&["DROP", "TYPE"]) {
        parse_drop(&mut cursor).map(|(names, if_exists)| SqlStatement::DropType { names, if_exists })
    } else if cursor.eat(&["CREATE", "UNIQUE", "INDEX"]) {
        parse_create_index(&mut cursor, true)
    } else if cursor.eat(&["CREATE", "INDEX"]) {
        parse_create_index(&mut cursor, false)
    } else if cursor.eat(&["DROP", "INDEX"]) {
        Some(SqlStatement::DropIndex)
    } else {
        None
    };
    parsed.unwrap_or_else(|| SqlStatement::Unknown(render(tokens)))
}

fn parse_create_table(cursor: &mut Cursor<'_>) -> Option<SqlStatement> {
    let if_not_exists = cursor.eat(&["IF", "NOT", "EXISTS"]);
    let name = cursor.ident()?;
    let body = cursor.group()?;

    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    for part in split_top_level_commas(body) {
        if is_table_constraint(part) {
            constraints.push(parse_table_constraint(part));
        } else if let Some(column) = parse_column_def(part) {
            columns.push(column);
        }
    }

    Some(SqlStatement::CreateTable {
        name,
        if_not_exists,
        columns,
        constraints,
    })
}

fn is_table_constraint(part: &[Token]) -> bool {
    part.first()
        .is_some_and(|t| TABLE_CONSTRAINT_WORDS.iter().any(|kw| t.is_keyword(kw)))
}

fn parse_table_constraint(part: &[Token]) -> TableConstraint {
    let mut cursor = Cursor::new(part);
    if cursor.eat(&["CONSTRAINT"]) {
        cursor.ident();
    }
    if cursor.eat(&["PRIMARY", "KEY"]) {
        return TableConstraint::PrimaryKey(ident_list(cursor.group().unwrap_or_default()));
    }
    if cursor.eat(&["UNIQUE"]) {
        cursor.eat(&["NULLS", "NOT", "DISTINCT"]);
        return TableConstraint::Unique(ident_list(cursor.group().unwrap_or_default()));
    }
    TableConstraint::Other
}

/// Reads `name type [constraints...]`.
///
/// The type runs until the first constraint keyword at parenthesis depth
/// zero, so `DECIMAL(10, 2)` and `DOUBLE PRECISION` stay whole.
fn parse_column_def(part: &[Token]) -> Option<ColumnDef> {
    let mut cursor = Cursor::new(part);
    let name = cursor.ident()?;

    let type_start = cursor.pos;
    let mut depth = 0usize;
    while let Some(token) = cursor.peek() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            t if depth == 0 && is_column_constraint_word(t) => break,
            _ => {}
        }
        cursor.pos += 1;
    }
    let data_type = render_type(&part[type_start..cursor.pos]);
    if data_type.is_empty() {
        return None;
    }

    let mut column = ColumnDef {
        name,
        data_type,
        not_null: false,
        primary_key: false,
        unique: false,
        default: None,
    };

    while !cursor.is_done() {
        if cursor.eat(&["NOT", "NULL"]) {
            column.not_null = true;
        } else if cursor.eat(&["PRIMARY", "KEY"]) {
            column.primary_key = true;
        } else if cursor.eat(&["UNIQUE"]) {
            column.unique = true;
        } else if cursor.eat(&["DEFAULT"]) {
            column.default = Some(take_default(&mut cursor));
        } else {
            cursor.advance();
        }
    }
    Some(column)
}

fn is_column_constraint_word(token: &Token) -> bool {
    COLUMN_CONSTRAINT_WORDS.iter().any(|kw| token.is_keyword(kw))
}

/// Consumes a `DEFAULT` expression up to the next constraint keyword.
fn take_default(cursor: &mut Cursor<'_>) -> String {
    let start = cursor.pos;
    let mut depth = 0usize;
    while let Some(token) = cursor.peek() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            // a leading NULL is the default itself
            t if depth == 0 && cursor.pos > start && is_column_constraint_word(t) => break,
            _ => {}
        }
        cursor.pos += 1;
    }
    render(&cursor.tokens[start..cursor.pos])
}

fn parse_alter_table(cursor: &mut Cursor<'_>) -> Option<SqlStatement> {
    cursor.eat(&["IF", "EXISTS"]);
    cursor.eat(&["ONLY"]);
    let name = cursor.ident()?;
    let actions: Vec<AlterAction> = split_top_level_commas(cursor.rest())
        .into_iter()
        .map(parse_alter_action)
        .collect();
    if actions.is_empty() {
        return None;
    }
    Some(SqlStatement::AlterTable { name, actions })
}

fn parse_alter_action(part: &[Token]) -> AlterAction {
    let mut cursor = Cursor::new(part);
    let action = if cursor.eat(&["ADD"]) {
        parse_add(&mut cursor)
    } else if cursor.eat(&["DROP"]) {
        parse_drop_column(&mut cursor)
    } else if cursor.eat(&["ALTER"]) {
        parse_alter_column(&mut cursor)
    } else if cursor.eat(&["RENAME"]) {
        parse_rename(&mut cursor)
    } else {
        None
    };
    action.unwrap_or_else(|| AlterAction::Other(render(part)))
}

fn parse_add(cursor: &mut Cursor<'_>) -> Option<AlterAction> {
    if is_table_constraint(cursor.rest()) {
        return Some(AlterAction::AddConstraint(parse_table_constraint(
            cursor.rest(),
        )));
    }
    cursor.eat(&["COLUMN"]);
    let if_not_exists = cursor.eat(&["IF", "NOT", "EXISTS"]);
    let column = parse_column_def(cursor.rest())?;
    Some(AlterAction::AddColumn {
        column,
        if_not_exists,
    })
}

fn parse_drop_column(cursor: &mut Cursor<'_>) -> Option<AlterAction> {
    if cursor.peek_keyword("CONSTRAINT") {
        return None;
    }
    cursor.eat(&["COLUMN"]);
    let if_exists = cursor.eat(&["IF", "EXISTS"]);
    let name = cursor.ident()?;
    Some(AlterAction::DropColumn { name, if_exists })
}

fn parse_alter_column(cursor: &mut Cursor<'_>) -> Option<AlterAction> {
    cursor.eat(&["COLUMN"]);
    let column = cursor.ident()?;

    if cursor.eat(&["SET", "DATA", "TYPE"]) || cursor.eat(&["TYPE"]) {
        let rest = cursor.rest();
        let end = rest
            .iter()
            .position(|t| t.is_keyword("USING") || t.is_keyword("COLLATE"))
            .unwrap_or(rest.len());
        let data_type = render_type(&rest[..end]);
        if data_type.is_empty() {
            return None;
        }
        return Some(AlterAction::AlterType { column, data_type });
    }
    if cursor.eat(&["SET", "NOT", "NULL"]) {
        return Some(AlterAction::SetNotNull(column));
    }
    if cursor.eat(&["DROP", "NOT", "NULL"]) {
        return Some(AlterAction::DropNotNull(column));
    }
    if cursor.eat(&["SET", "DEFAULT"]) {
        let expr = render(cursor.rest());
        return Some(AlterAction::SetDefault { column, expr });
    }
    if cursor.eat(&["DROP", "DEFAULT"]) {
        return Some(AlterAction::DropDefault(column));
    }
    None
}

fn parse_rename(cursor: &mut Cursor<'_>) -> Option<AlterAction> {
    if cursor.eat(&["TO"]) {
        return cursor.ident().map(AlterAction::RenameTable);
    }
    if cursor.peek_keyword("CONSTRAINT") {
        return None;
    }
    cursor.eat(&["COLUMN"]);
    let from = cursor.ident()?;
    if !cursor.eat(&["TO"]) {
        return None;
    }
    let to = cursor.ident()?;
    Some(AlterAction::RenameColumn { from, to })
}

fn parse_drop(cursor: &mut Cursor<'_>) -> Option<(Vec<String>, bool)> {
    let if_exists = cursor.eat(&["IF", "EXISTS"]);
    let names: Vec<String> = split_top_level_commas(cursor.rest())
        .into_iter()
        .filter_map(|part| part.first().and_then(Token::ident).map(str::to_string))
        .collect();
    if names.is_empty() {
        return None;
    }
    Some((names, if_exists))
}

fn parse_create_enum(cursor: &mut Cursor<'_>) -> Option<SqlStatement> {
    let name = cursor.ident()?;
    if !cursor.eat(&["AS", "ENUM"]) {
        return None;
    }
    let values = cursor
        .group()?
        .iter()
        .filter_map(|t| match t {
            Token::Str(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    Some(SqlStatement::CreateEnum { name, values })
}

fn parse_alter_type(cursor: &mut Cursor<'_>) -> Option<SqlStatement> {
    let name = cursor.ident()?;
    if !cursor.eat(&["ADD", "VALUE"]) {
        return None;
    }
    cursor.eat(&["IF", "NOT", "EXISTS"]);
    let value = cursor.string()?;
    let position = if cursor.eat(&["BEFORE"]) {
        cursor.string().map(EnumValuePosition::Before)
    } else if cursor.eat(&["AFTER"]) {
        cursor.string().map(EnumValuePosition::After)
    } else {
        None
    };
    Some(SqlStatement::AddEnumValue {
        name,
        value,
        position,
    })
}

fn parse_create_index(cursor: &mut Cursor<'_>, unique: bool) -> Option<SqlStatement> {
    cursor.eat(&["CONCURRENTLY"]);
    cursor.eat(&["IF", "NOT", "EXISTS"]);
    let name = if cursor.peek_keyword("ON") {
        None
    } else {
        Some(cursor.ident()?)
    };
    if !cursor.eat(&["ON"]) {
        return None;
    }
    cursor.eat(&["ONLY"]);
    let table = cursor.ident()?;
    if cursor.eat(&["USING"]) {
        cursor.ident();
    }
    let group = cursor.group()?;

    // expression indexes cannot be mapped onto columns
    let parts = split_top_level_commas(group);
    let columns: Vec<String> = parts
        .iter()
        .filter_map(|part| match part.first() {
            Some(Token::Word(w) | Token::Quoted(w)) if !matches!(part.get(1), Some(Token::LParen)) => {
                Some(w.clone())
            }
            _ => None,
        })
        .collect();
    if columns.is_empty() || columns.len() != parts.len() {
        return None;
    }

    Some(SqlStatement::CreateIndex {
        name,
        table,
        columns,
        unique,
    })
}

fn ident_list(tokens: &[Token]) -> Vec<String> {
    split_top_level_commas(tokens)
        .into_iter()
        .filter_map(|part| part.first().and_then(Token::ident).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::scanner::split_statements;

    fn parse(sql: &str) -> SqlStatement {
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 1, "expected one statement in {sql}");
        parse_statement(&statements[0])
    }

    fn columns(sql: &str) -> Vec<ColumnDef> {
        match parse(sql) {
            SqlStatement::CreateTable { columns, .. } => columns,
            other => panic!("expected CREATE TABLE, got {other:?}"),
        }
    }

    #[test]
    fn test_create_table_columns() {
        let cols = columns(
            "CREATE TABLE organizations (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                note TEXT
            );",
        );
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].data_type, "SERIAL");
        assert!(!cols[0].is_nullable());
        assert!(!cols[1].is_nullable());
        assert!(cols[2].is_nullable());
    }

    #[test]
    fn test_parenthesized_type_is_not_split() {
        let cols = columns("CREATE TABLE p (price DECIMAL(10, 2) NOT NULL, name TEXT);");
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "price");
        assert_eq!(cols[0].data_type, "DECIMAL(10, 2)");
        assert!(cols[0].not_null);
        assert_eq!(cols[1].data_type, "TEXT");
    }

    #[test]
    fn test_multi_word_types() {
        let cols = columns(
            "CREATE TABLE t (a DOUBLE PRECISION, b CHARACTER VARYING(20) NOT NULL, \
             c TIMESTAMP WITH TIME ZONE DEFAULT now())",
        );
        assert_eq!(cols[0].data_type, "DOUBLE PRECISION");
        assert_eq!(cols[1].data_type, "CHARACTER VARYING(20)");
        assert_eq!(cols[2].data_type, "TIMESTAMP WITH TIME ZONE");
        assert_eq!(cols[2].default.as_deref(), Some("now()"));
    }

    #[test]
    fn test_table_constraints_are_not_columns() {
        let sql = "CREATE TABLE IF NOT EXISTS members (
            user_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            PRIMARY KEY (user_id, team_id),
            CONSTRAINT fk_members_user_id FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE (team_id),
            CHECK (user_id > 0)
        );";
        match parse(sql) {
            SqlStatement::CreateTable {
                name,
                if_not_exists,
                columns,
                constraints,
            } => {
                assert_eq!(name, "members");
                assert!(if_not_exists);
                assert_eq!(columns.len(), 2);
                assert_eq!(
                    constraints,
                    vec![
                        TableConstraint::PrimaryKey(vec!["user_id".into(), "team_id".into()]),
                        TableConstraint::Other,
                        TableConstraint::Unique(vec!["team_id".into()]),
                        TableConstraint::Other,
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let cols = columns(
            "CREATE TABLE t (a TEXT DEFAULT 'draft' NOT NULL, b BOOLEAN DEFAULT FALSE, \
             c INTEGER DEFAULT NULL, d TEXT DEFAULT 'x'::text)",
        );
        assert_eq!(cols[0].default.as_deref(), Some("'draft'"));
        assert!(cols[0].not_null);
        assert_eq!(cols[1].default.as_deref(), Some("FALSE"));
        assert_eq!(cols[2].default.as_deref(), Some("NULL"));
        assert_eq!(cols[3].default.as_deref(), Some("'x'::text"));
    }

    #[test]
    fn test_quoted_identifiers() {
        let cols = columns("CREATE TABLE \"Users\" (\"createdAt\" TIMESTAMP NOT NULL)");
        assert_eq!(cols[0].name, "createdAt");
    }

    #[test]
    fn test_alter_table_actions() {
        let stmt = parse(
            "ALTER TABLE users ADD COLUMN age INTEGER NOT NULL, DROP COLUMN IF EXISTS legacy, \
             ALTER COLUMN status TYPE INTEGER USING status::INTEGER, \
             ALTER COLUMN name SET NOT NULL, ALTER name DROP NOT NULL;",
        );
        let SqlStatement::AlterTable { name, actions } = stmt else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(name, "users");
        assert_eq!(actions.len(), 5);
        assert!(matches!(&actions[0], AlterAction::AddColumn { column, if_not_exists: false }
            if column.name == "age" && column.not_null));
        assert_eq!(
            actions[1],
            AlterAction::DropColumn {
                name: "legacy".into(),
                if_exists: true
            }
        );
        assert_eq!(
            actions[2],
            AlterAction::AlterType {
                column: "status".into(),
                data_type: "INTEGER".into()
            }
        );
        assert_eq!(actions[3], AlterAction::SetNotNull("name".into()));
        assert_eq!(actions[4], AlterAction::DropNotNull("name".into()));
    }

    #[test]
    fn test_alter_type_with_parens_and_set_data() {
        let stmt = parse("ALTER TABLE t ALTER COLUMN price SET DATA TYPE DECIMAL(12, 4);");
        let SqlStatement::AlterTable { actions, .. } = stmt else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(
            actions[0],
            AlterAction::AlterType {
                column: "price".into(),
                data_type: "DECIMAL(12, 4)".into()
            }
        );
    }

    #[test]
    fn test_renames() {
        let SqlStatement::AlterTable { actions, .. } = parse("ALTER TABLE a RENAME COLUMN x TO y")
        else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(
            actions[0],
            AlterAction::RenameColumn {
                from: "x".into(),
                to: "y".into()
            }
        );

        let SqlStatement::AlterTable { actions, .. } = parse("ALTER TABLE a RENAME TO b") else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(actions[0], AlterAction::RenameTable("b".into()));
    }

    #[test]
    fn test_add_constraint() {
        let SqlStatement::AlterTable { actions, .. } =
            parse("ALTER TABLE a ADD CONSTRAINT a_pkey PRIMARY KEY (id)")
        else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(
            actions[0],
            AlterAction::AddConstraint(TableConstraint::PrimaryKey(vec!["id".into()]))
        );
    }

    #[test]
    fn test_enum_statements() {
        assert_eq!(
            parse("CREATE TYPE UserStatus AS ENUM ('ACTIVE', 'INACTIVE', 'PENDING');"),
            SqlStatement::CreateEnum {
                name: "UserStatus".into(),
                values: vec!["ACTIVE".into(), "INACTIVE".into(), "PENDING".into()],
            }
        );
        assert_eq!(
            parse("ALTER TYPE UserStatus ADD VALUE IF NOT EXISTS 'BANNED' AFTER 'ACTIVE'"),
            SqlStatement::AddEnumValue {
                name: "UserStatus".into(),
                value: "BANNED".into(),
                position: Some(EnumValuePosition::After("ACTIVE".into())),
            }
        );
        assert_eq!(
            parse("DROP TYPE IF EXISTS UserStatus;"),
            SqlStatement::DropType {
                names: vec!["UserStatus".into()],
                if_exists: true
            }
        );
    }

    #[test]
    fn test_drop_table_variants() {
        assert_eq!(
            parse("DROP TABLE a, b CASCADE"),
            SqlStatement::DropTable {
                names: vec!["a".into(), "b".into()],
                if_exists: false
            }
        );
    }

    #[test]
    fn test_create_index() {
        assert_eq!(
            parse("CREATE UNIQUE INDEX idx_uniq_users_email ON users(email);"),
            SqlStatement::CreateIndex {
                name: Some("idx_uniq_users_email".into()),
                table: "users".into(),
                columns: vec!["email".into()],
                unique: true,
            }
        );
        assert!(matches!(
            parse("CREATE INDEX IF NOT EXISTS idx ON users USING btree (a, b DESC)"),
            SqlStatement::CreateIndex { unique: false, ref columns, .. } if columns.len() == 2
        ));
        assert!(matches!(
            parse("CREATE INDEX idx ON users (lower(email))"),
            SqlStatement::Unknown(_)
        ));
    }

    #[test]
    fn test_unknown_statement() {
        assert_eq!(
            parse("INSERT INTO users (id) VALUES (1)"),
            SqlStatement::Unknown("INSERT INTO users(id) VALUES(1)".into())
        );
    }
}
