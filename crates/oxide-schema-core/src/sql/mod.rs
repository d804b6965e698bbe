//! SQL migration parsing and replay.
//!
//! The [`scanner`] splits SQL into statements, [`statement`] recognizes the
//! DDL subset that changes structure, and [`replay`] applies it to a
//! [`Schema`](crate::model::Schema).

pub mod replay;
pub mod scanner;
pub mod statement;

pub use replay::{SchemaReplayer, replay_migrations};
pub use statement::{SqlStatement, parse_statement};
