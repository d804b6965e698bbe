//! oxide-schema CLI
//!
//! Command-line tool for generating goose migrations from a schema file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use oxide_schema::prelude::*;
use oxide_schema_core::model::Schema;
use oxide_schema_core::types::sql_type_for_field;

/// Declarative schema to goose migrations for PostgreSQL.
#[derive(Parser)]
#[command(name = "oxide-schema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Schema file.
    #[arg(short, long, env = "SCHEMA_PATH", default_value = "schema.prisma")]
    schema: PathBuf,

    /// Migrations directory.
    #[arg(short, long, env = "MIGRATIONS_DIR", default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Fail on constructs that cannot be parsed instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a migration from schema changes.
    Generate {
        /// Migration name.
        #[arg(short, long)]
        name: String,

        /// Write risky migrations without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Create an empty migration file for hand-written SQL.
    Empty {
        /// Migration name.
        #[arg(short, long)]
        name: String,
    },

    /// Check the schema file without generating anything.
    Validate,

    /// Print the migration that would be generated.
    Diff {
        /// Compare against this schema file instead of the migrations.
        #[arg(long)]
        from: Option<PathBuf>,

        /// Print the changes and warnings as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the schema the existing migrations produce.
    Show {
        /// Print the schema as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Adopt an existing database from a JSON table description.
    Baseline {
        /// Introspected tables (JSON array).
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the schema file.
        #[arg(short, long, default_value = "schema.prisma")]
        output: PathBuf,

        /// Overwrite an existing schema file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::new()
        .with_schema_path(&cli.schema)
        .with_migrations_dir(&cli.migrations_dir)
        .strict(cli.strict);
    let workflow = Workflow::from_config(&config);

    match cli.command {
        Commands::Generate { name, yes } => {
            let plan = workflow.plan()?;
            let outcome = if yes {
                workflow.commit(&plan, &name, &mut AlwaysConfirm)?
            } else {
                workflow.commit(&plan, &name, &mut Prompt::stdio())?
            };
            match outcome {
                Outcome::NoChanges => println!("No changes detected."),
                Outcome::Declined => println!("Migration generation cancelled."),
                Outcome::Written(path) => println!("Created migration: {}", path.display()),
            }
        }

        Commands::Empty { name } => {
            let path = workflow.write_empty(&name)?;
            println!("Created empty migration: {}", path.display());
            println!("You can now edit this file to add your custom SQL statements.");
        }

        Commands::Validate => {
            let schema = workflow.load_target()?;
            info!(
                "{} is valid: {} model(s), {} enum(s).",
                config.schema_path.display(),
                schema.models.len(),
                schema.enums.len()
            );
        }

        Commands::Diff { from, json } => {
            let plan = match from {
                Some(from) => Workflow::new(
                    SchemaFile::new(&config.schema_path),
                    SchemaFile::new(from),
                    MigrationWriter::new(&config.migrations_dir),
                )
                .strict(config.strict)
                .plan()?,
                None => workflow.plan()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else if plan.is_empty() {
                println!("No changes detected.");
            } else {
                for warning in plan.warnings() {
                    warn!("{warning}");
                }
                print!("{}", plan.migration.to_file_contents());
            }
        }

        Commands::Show { json } => {
            let schema = workflow.load_current()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schema)?);
            } else {
                print_schema(&schema);
            }
        }

        Commands::Baseline {
            input,
            output,
            force,
        } => {
            let result = baseline(&JsonIntrospection::new(&input))?;
            if !result.round_trips {
                warn!("The generated schema file does not describe the tables exactly; review it before the next generate.");
            }

            let path = result.write(workflow.writer(), &output, force)?;
            info!("Wrote {}", output.display());
            println!("Created baseline migration: {}", path.display());
        }
    }

    Ok(())
}

fn print_schema(schema: &Schema) {
    if schema.is_empty() {
        println!("No tables or enums.");
        return;
    }

    for enumeration in &schema.enums {
        println!("enum {} ({})", enumeration.name, enumeration.values.join(", "));
    }
    for model in &schema.models {
        println!("\n{}", model.table_name);
        println!("{:-<60}", "");
        for field in model.fields.iter().filter(|f| schema.materializes(f)) {
            let null = if field.is_optional { "" } else { " NOT NULL" };
            println!("  {:<28}{}{null}", field.column_name, sql_type_for_field(field));
        }
    }
    println!();
}
