//! Persistence module split across logical submodules.

mod connection;
mod items;
mod loans;
mod stats;

pub use connection::{ensure_schema, Store};
pub use items::{create_item, fetch_available_items, fetch_items, find_item, seed_catalog};
pub use loans::{create_loan, delete_loan, fetch_loans, find_loan};
pub use stats::fetch_stats;
