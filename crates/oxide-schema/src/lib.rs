//! # oxide-schema
//!
//! Generates goose migrations for PostgreSQL from a declarative schema
//! file.
//!
//! The current database schema is never queried: it is rebuilt by
//! replaying the migration files already on disk. The difference between
//! that and the schema file becomes the next migration.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_schema::prelude::*;
//!
//! let config = Config::new().with_migrations_dir("db/migrations");
//! let workflow = Workflow::from_config(&config);
//!
//! let plan = workflow.plan()?;
//! match workflow.commit(&plan, "add_users", &mut AlwaysConfirm)? {
//!     Outcome::Written(path) => println!("Created migration: {}", path.display()),
//!     Outcome::NoChanges => println!("No changes detected."),
//!     Outcome::Declined => println!("Migration generation cancelled."),
//! }
//! # Ok::<(), SchemaError>(())
//! ```

pub mod baseline;
pub mod config;
pub mod error;
pub mod source;
pub mod workflow;
pub mod writer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::baseline::{Baseline, JsonIntrospection, baseline};
    pub use crate::config::Config;
    pub use crate::error::{Result, SchemaError};
    pub use crate::source::{MigrationsDir, SchemaFile, SchemaSource};
    pub use crate::workflow::{AlwaysConfirm, Confirm, Outcome, Plan, Prompt, Workflow};
    pub use crate::writer::{MigrationWriter, generate_migration_name};
}
