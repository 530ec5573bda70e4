//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `shelf_core` linkage and store bootstrap from a shell.
//! - Print entity listings as JSON for quick local sanity checks.

use clap::{Parser, Subcommand};
use shelf_core::{
    Author, AuthorDao, AuthorDaoImpl, Book, BookDao, BookDaoImpl, SqliteSessionFactory,
    StoreConfig,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(version, about = "Shelf data-access smoke tool", long_about = None)]
struct Arguments {
    #[arg(
        long = "db",
        env = "SHELF_DB",
        help = "SQLite database file; an in-memory store is used when omitted"
    )]
    db: Option<PathBuf>,

    #[arg(long = "log-level", env = "SHELF_LOG_LEVEL", help = "trace|debug|info|warn|error")]
    log_level: Option<String>,

    #[arg(
        long = "log-dir",
        env = "SHELF_LOG_DIR",
        help = "Absolute directory for rolling log files; logging is off when omitted"
    )]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the core crate version.
    Version,
    /// List every author as JSON.
    Authors,
    /// List every book as JSON.
    Books,
    /// Round-trip one author and one book through the DAOs in memory.
    Demo,
}

fn main() -> Result<(), Box<dyn Error>> {
    let arguments = Arguments::parse();

    if let Some(log_dir) = arguments.log_dir.as_deref() {
        let level = arguments
            .log_level
            .as_deref()
            .unwrap_or(shelf_core::default_log_level());
        shelf_core::init_logging(level, log_dir)?;
    }

    if let Command::Version = arguments.command {
        println!("shelf_core version={}", shelf_core::core_version());
        return Ok(());
    }

    // Demo always runs against a throwaway in-memory store.
    let config = match (&arguments.command, arguments.db) {
        (Command::Demo, _) | (_, None) => StoreConfig::in_memory(),
        (_, Some(path)) => StoreConfig::file(path),
    };
    let factory = Arc::new(SqliteSessionFactory::new(&config)?);
    let authors = AuthorDaoImpl::new(Arc::clone(&factory));
    let books = BookDaoImpl::new(Arc::clone(&factory));

    match arguments.command {
        Command::Version => {}
        Command::Authors => println!("{}", serde_json::to_string_pretty(&authors.find_all()?)?),
        Command::Books => println!("{}", serde_json::to_string_pretty(&books.find_all()?)?),
        Command::Demo => {
            let author = authors.save_new_author(Author::new("Craig", "Walls"))?;
            let book = books.save_new_book(Book::new("Spring in Action", "978-1617294945"))?;
            log::info!("event=cli_demo module=cli status=ok");
            println!("{}", serde_json::to_string_pretty(&author)?);
            println!("{}", serde_json::to_string_pretty(&book)?);
            println!(
                "{}",
                serde_json::to_string_pretty(&authors.find_author_by_name_criteria("Craig", "Walls")?)?
            );
        }
    }

    Ok(())
}
