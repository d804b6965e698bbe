//! goose migration file format.
//!
//! A migration is plain SQL with an up and a down section. Each statement
//! is wrapped in its own `StatementBegin`/`StatementEnd` block.

/// Starts the forward section.
pub const UP_MARKER: &str = "-- +goose Up";
/// Starts the reverse section.
pub const DOWN_MARKER: &str = "-- +goose Down";
/// Opens a statement block.
pub const STATEMENT_BEGIN: &str = "-- +goose StatementBegin";
/// Closes a statement block.
pub const STATEMENT_END: &str = "-- +goose StatementEnd";

/// Wraps one statement in a statement block, with an optional
/// `-- WARNING:` line inside the block.
#[must_use]
pub fn wrap_statement(sql: &str, warning: Option<&str>) -> String {
    let mut block = String::with_capacity(sql.len() + 64);
    block.push_str(STATEMENT_BEGIN);
    block.push('\n');
    if let Some(warning) = warning {
        block.push_str("-- WARNING: ");
        block.push_str(warning);
        block.push('\n');
    }
    block.push_str(sql);
    block.push('\n');
    block.push_str(STATEMENT_END);
    block
}

/// Builds the full file text from already wrapped up and down blocks.
#[must_use]
pub fn compose_migration(up: &str, down: &str) -> String {
    format!("{UP_MARKER}\n{up}\n\n{DOWN_MARKER}\n{down}\n")
}

/// Template for a hand-written migration.
#[must_use]
pub fn empty_migration() -> String {
    compose_migration(
        &wrap_statement(
            "-- Write your SQL here (e.g., CREATE INDEX, TRIGGER, FUNCTION, etc.)\n",
            None,
        ),
        &wrap_statement("-- Write the rollback SQL here\n", None),
    )
}

/// Returns the up section of a migration file: everything after the up
/// marker and before the down marker, if one follows.
///
/// Returns `None` if the file has no up marker.
#[must_use]
pub fn up_section(text: &str) -> Option<&str> {
    let up_start = find_marker(text, "up")?;
    let body = &text[up_start..];
    Some(find_marker(body, "down").map_or(body, |down| &body[..down]))
}

/// Byte offset just past a `-- +goose <word>` line.
fn find_marker(text: &str, word: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("--") {
            let mut parts = rest.split_whitespace();
            if parts.next() == Some("+goose")
                && parts.next().is_some_and(|w| w.eq_ignore_ascii_case(word))
            {
                return Some(offset + line.len());
            }
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_statement() {
        assert_eq!(
            wrap_statement("DROP TABLE IF EXISTS a;", None),
            "-- +goose StatementBegin\nDROP TABLE IF EXISTS a;\n-- +goose StatementEnd"
        );
        assert_eq!(
            wrap_statement("DROP TABLE IF EXISTS a;", Some("data loss")),
            "-- +goose StatementBegin\n-- WARNING: data loss\nDROP TABLE IF EXISTS a;\n-- +goose StatementEnd"
        );
    }

    #[test]
    fn test_compose_migration() {
        let text = compose_migration("UP", "DOWN");
        assert_eq!(text, "-- +goose Up\nUP\n\n-- +goose Down\nDOWN\n");
    }

    #[test]
    fn test_up_section_stops_at_down() {
        let text = compose_migration("CREATE TABLE a (id INTEGER);", "DROP TABLE a;");
        let up = up_section(&text).unwrap();
        assert!(up.contains("CREATE TABLE a"));
        assert!(!up.contains("DROP TABLE"));
    }

    #[test]
    fn test_up_section_without_down_runs_to_end() {
        let up = up_section("-- +goose Up\nCREATE TABLE a (id INTEGER);\n").unwrap();
        assert_eq!(up, "CREATE TABLE a (id INTEGER);\n");
    }

    #[test]
    fn test_missing_up_marker() {
        assert!(up_section("CREATE TABLE a (id INTEGER);").is_none());
    }

    #[test]
    fn test_empty_migration_has_both_sections() {
        let text = empty_migration();
        assert!(text.starts_with(UP_MARKER));
        assert!(text.contains(DOWN_MARKER));
        assert_eq!(text.matches(STATEMENT_BEGIN).count(), 2);
        assert_eq!(text.matches(STATEMENT_END).count(), 2);
    }
}
