//! Bracket- and quote-aware splitting helpers.

/// Tracks nesting and quoting while walking a string.
#[derive(Debug, Default)]
struct Nesting {
    depth: usize,
    quote: Option<char>,
    escaped: bool,
}

impl Nesting {
    /// Feeds one character; returns `true` if it sits at the top level
    /// outside any quote or bracket.
    fn feed(&mut self, c: char) -> bool {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            return false;
        }
        match c {
            '"' | '\'' => {
                self.quote = Some(c);
                false
            }
            '(' | '[' | '{' => {
                self.depth += 1;
                false
            }
            ')' | ']' | '}' => {
                self.depth = self.depth.saturating_sub(1);
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// Splits on `sep` occurring outside brackets, parentheses and quotes.
///
/// Pieces are trimmed; empty pieces are dropped.
#[must_use]
pub fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();

    for c in input.chars() {
        if nesting.feed(c) && c == sep {
            push_trimmed(&mut parts, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_trimmed(&mut parts, &current);
    parts
}

/// Splits a field line into whitespace-separated tokens, keeping
/// `@relation(fields: [a], references: [id])` in one piece.
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();

    for c in line.chars() {
        if nesting.feed(c) && c.is_whitespace() {
            push_trimmed(&mut tokens, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_trimmed(&mut tokens, &current);
    tokens
}

/// Removes a trailing `//` comment that is not inside a string.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    let mut nesting = Nesting::default();
    let mut prev_slash = false;

    for (i, c) in line.char_indices() {
        nesting.feed(c);
        if c == '/' && nesting.quote.is_none() {
            if prev_slash {
                return &line[..i - 1];
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
    }
    line
}

/// Splits `name(args...)` into the name and its top-level arguments.
///
/// `id` yields `("id", [])`; `db.VarChar(255)` yields
/// `("db.VarChar", ["255"])`. An unterminated argument list keeps
/// everything after the opening parenthesis.
#[must_use]
pub fn parse_call(raw: &str) -> (String, Vec<String>) {
    let raw = raw.trim();
    let Some(open) = raw.find('(') else {
        return (raw.to_string(), Vec::new());
    };
    let name = raw[..open].trim().to_string();
    let rest = &raw[open + 1..];
    let inner = rest.rfind(')').map_or(rest, |close| &rest[..close]);
    (name, split_top_level(inner, ','))
}

fn push_trimmed(parts: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        parts.push(piece.to_string());
    }
}
