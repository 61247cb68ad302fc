//! Core library surface for the lending ledger.
//!
//! The binary wires these pieces together; integration tests and the command
//! line reuse the same persistence functions the dashboard calls.
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;
pub mod validation;

/// Convenience re-exports for the persistence layer.
pub use db::{
    create_item, create_loan, delete_loan, fetch_available_items, fetch_loans, fetch_stats, Store,
};

pub use error::LedgerError;

/// Domain types shared by every layer.
pub use models::{Item, LedgerStats, LoanRecord, LoanRow, NewLoan};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
