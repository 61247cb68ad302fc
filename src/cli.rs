//! Command-line surface. Without a subcommand the dashboard opens; every other
//! subcommand runs one ledger operation and exits.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lending-ledger")]
#[command(about = "Track books lent to students, their return dates and late fines.")]
pub struct CommandLine {
    /// SQLite database to use (defaults to ~/.lending-ledger/library.db)
    #[arg(long, global = true, env = "LENDING_LEDGER_DB")]
    pub db: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Open the interactive dashboard (default)
    Ui,
    /// Print the dashboard counters
    Stats,
    /// List books with at least one copy available
    #[command(alias = "a")]
    Available,
    /// List the whole catalog
    Items,
    /// Add a book to the catalog
    AddItem {
        title: String,
        /// Copies placed on the shelf
        #[arg(long, short, default_value_t = 1)]
        quantity: i64,
    },
    /// Fill an empty catalog with sample books
    Seed,
    /// Print loan records, newest first
    #[command(alias = "l")]
    Loans {
        /// Keep rows whose student or book contains this text
        #[arg(long, short, default_value = "")]
        search: String,
    },
    /// Lend a book to a student
    #[command(alias = "b")]
    Borrow {
        /// Name of the borrowing student
        #[arg(long)]
        student: String,
        /// Catalog id of the book
        #[arg(long)]
        book: i64,
        /// Defaults to today
        #[arg(long)]
        borrow_date: Option<NaiveDate>,
        /// Defaults to today
        #[arg(long)]
        return_date: Option<NaiveDate>,
    },
    /// Delete a loan record and return its copy to the shelf
    #[command(alias = "d")]
    Delete {
        /// Loan record id
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
}

impl CommandLine {
    /// Parse `std::env::args`, exiting with clap's usage message on error.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_is_the_default() {
        let cli = CommandLine::try_parse_from(["lending-ledger"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn borrow_parses_iso_dates() {
        let cli = CommandLine::try_parse_from([
            "lending-ledger",
            "--db",
            "/tmp/x.db",
            "borrow",
            "--student",
            "Ann",
            "--book",
            "2",
            "--return-date",
            "2024-01-12",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(
            cli.command,
            Some(Commands::Borrow {
                student: "Ann".to_string(),
                book: 2,
                borrow_date: None,
                return_date: NaiveDate::from_ymd_opt(2024, 1, 12),
            })
        );
    }

    #[test]
    fn delete_accepts_negative_ids_for_validation() {
        let cli = CommandLine::try_parse_from(["lending-ledger", "delete", "-3"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Delete { id: -3 }));
    }
}
