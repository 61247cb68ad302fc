//! Binary entry point: resolve settings, install logging, open the store, then
//! either launch the dashboard or run a single command.
use std::io::{self, Write};

use anyhow::Result;
use lending_ledger::cli::{CommandLine, Commands};
use lending_ledger::config::{self, Settings};
use lending_ledger::logging::{self, LogTarget};
use lending_ledger::validation::LoanRequest;
use lending_ledger::{commands, run_app, App, Store};
use tracing::info;

fn main() -> Result<()> {
    let cli = CommandLine::parse_args();
    let settings = Settings::resolve(cli.db, &cli.log_level)?;
    let command = cli.command.unwrap_or(Commands::Ui);

    let target = if command == Commands::Ui {
        LogTarget::File(&settings.log_path)
    } else {
        LogTarget::Stderr
    };
    logging::init(&settings.log_level, target)?;

    let store = Store::open(&settings.db_path)?;
    info!(db = %store.path().display(), "ledger ready");
    match command {
        Commands::Ui => {
            let mut app = App::new(store)?;
            run_app(&mut app)
        }
        other => run_command(other, &store, &mut io::stdout().lock()),
    }
}

/// Run one non-interactive command against a fresh connection.
fn run_command(command: Commands, store: &Store, out: &mut impl Write) -> Result<()> {
    let today = config::today();
    match command {
        Commands::Ui => Ok(()),
        Commands::Stats => commands::stats(store, today, out),
        Commands::Available => commands::available(store, out),
        Commands::Items => commands::items(store, out),
        Commands::AddItem { title, quantity } => commands::add_item(store, &title, quantity, out),
        Commands::Seed => commands::seed(store, out),
        Commands::Loans { search } => commands::loans(store, &search, today, out),
        Commands::Borrow {
            student,
            book,
            borrow_date,
            return_date,
        } => {
            let request = LoanRequest {
                borrower: student,
                item_id: Some(book),
                borrow_date: borrow_date.unwrap_or(today),
                return_date: return_date.unwrap_or(today),
            };
            commands::borrow(store, request, today, out)
        }
        Commands::Delete { id } => commands::delete(store, id, out),
    }
}
