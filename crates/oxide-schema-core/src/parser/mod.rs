//! Parsers and their diagnostics.
//!
//! Both the schema text parser and the SQL migration replayer are lenient:
//! anything they do not understand is skipped and reported as a
//! [`Diagnostic`] next to the parsed value. Callers decide whether
//! diagnostics are advisory (logged) or fatal (see [`Parsed::into_strict`]).

mod args;
mod schema_file;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use args::{parse_call, split_top_level, strip_comment, tokenize};
pub use schema_file::parse_schema;

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DiagnosticKind {
    /// A top-level line or block the parser does not recognize.
    #[error("unknown construct")]
    UnknownConstruct,
    /// A field line without a name and a type.
    #[error("malformed field")]
    MalformedField,
    /// End of input inside a block.
    #[error("unterminated block")]
    UnterminatedBlock,
    /// A `}` outside any block.
    #[error("stray closing brace")]
    StrayClosingBrace,
    /// A SQL statement outside the replayed grammar.
    #[error("unrecognized statement")]
    UnrecognizedStatement,
    /// A migration file without a `-- +goose Up` marker.
    #[error("missing up section")]
    MissingUpSection,
    /// A statement targeting a table that does not exist at that point.
    #[error("unknown table")]
    UnknownTable,
    /// A statement targeting a column that does not exist at that point.
    #[error("unknown column")]
    UnknownColumn,
    /// A statement targeting an enum type that does not exist at that point.
    #[error("unknown type")]
    UnknownType,
}

/// A skipped construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File or source name, when known.
    pub source: Option<String>,
    /// 1-based line number, when known.
    pub line: Option<usize>,
    /// Classification.
    pub kind: DiagnosticKind,
    /// Offending text, possibly shortened.
    pub snippet: String,
}

impl Diagnostic {
    /// Creates a diagnostic without location.
    #[must_use]
    pub fn new(kind: DiagnosticKind, snippet: impl Into<String>) -> Self {
        let snippet: String = snippet.into();
        Self {
            source: None,
            line: None,
            kind,
            snippet: shorten(&snippet),
        }
    }

    /// Sets the line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the source name.
    #[must_use]
    pub fn in_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.line) {
            (Some(source), Some(line)) => write!(f, "{source}:{line}: ")?,
            (Some(source), None) => write!(f, "{source}: ")?,
            (None, Some(line)) => write!(f, "line {line}: ")?,
            (None, None) => {}
        }
        write!(f, "{}: {}", self.kind, self.snippet)
    }
}

/// Diagnostics promoted to an error by [`Parsed::into_strict`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} construct(s) could not be parsed: {}", .diagnostics.len(), join(.diagnostics))]
pub struct StrictParseError {
    /// Every diagnostic that was produced.
    pub diagnostics: Vec<Diagnostic>,
}

fn join(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A parsed value together with whatever was skipped on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parsed<T> {
    /// The (possibly incomplete) result.
    pub value: T,
    /// Skipped constructs, in input order.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Parsed<T> {
    /// Wraps a value with no diagnostics.
    #[must_use]
    pub const fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Returns `true` if nothing was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Tags every diagnostic that has no source yet.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        for diagnostic in &mut self.diagnostics {
            if diagnostic.source.is_none() {
                diagnostic.source = Some(source.to_string());
            }
        }
        self
    }

    /// Returns the value, discarding diagnostics.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Returns the value only if nothing was skipped.
    pub fn into_strict(self) -> Result<T, StrictParseError> {
        if self.diagnostics.is_empty() {
            Ok(self.value)
        } else {
            Err(StrictParseError {
                diagnostics: self.diagnostics,
            })
        }
    }
}

fn shorten(snippet: &str) -> String {
    const MAX: usize = 80;
    let snippet = snippet.trim();
    if snippet.chars().count() <= MAX {
        snippet.to_string()
    } else {
        let cut: String = snippet.chars().take(MAX).collect();
        format!("{cut}...")
    }
}
