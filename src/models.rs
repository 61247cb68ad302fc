//! Domain models that mirror the SQLite schema and get passed throughout the
//! dashboard and the command line. They stay light-weight data holders so the
//! persistence layer owns every mutation.

use std::fmt;

use chrono::NaiveDate;

/// Penalty charged for every day a loan's return date lies in the past.
pub const FINE_PER_DAY: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
/// A catalog entry. One row stands for `quantity` identical copies.
pub struct Item {
    /// Primary key in `books`.
    pub id: i64,
    /// Title shown in the borrow form and the loan table.
    pub title: String,
    /// Copies currently on the shelf.
    pub quantity: i64,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One lending transaction as stored in `borrowed_books`.
pub struct LoanRecord {
    /// Record id the delete form asks for.
    pub id: i64,
    /// Student holding the copy, already trimmed.
    pub borrower_name: String,
    /// The lent book, referencing `books.id`.
    pub item_id: i64,
    pub borrow_date: NaiveDate,
    /// Date the copy is due back; earlier than today means overdue.
    pub return_date: NaiveDate,
    /// Frozen at creation time, never recomputed.
    pub fine: f64,
}

/// A validated request to lend one copy of an item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    /// Non-empty after trimming.
    pub borrower_name: String,
    pub item_id: i64,
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
/// Loan record joined with the title of the borrowed item. This is the shape
/// the loan table and the `loans` command display.
pub struct LoanRow {
    pub id: i64,
    pub borrower_name: String,
    /// Title joined in from `books`.
    pub item_title: String,
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
    pub fine: f64,
}

impl LoanRow {
    /// Overdue status is evaluated against the date of the query, not the date
    /// the loan was written.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.return_date < today
    }

    /// Case-insensitive substring match over the borrower and the item title.
    /// An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.borrower_name.to_lowercase().contains(&needle)
            || self.item_title.to_lowercase().contains(&needle)
    }
}

/// The four dashboard counters. Each one comes from its own query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerStats {
    /// Sum of `quantity` over the catalog.
    pub total_available: i64,
    /// Number of loan records, overdue ones included.
    pub total_borrowed: i64,
    /// Loans whose return date is before today.
    pub overdue_count: i64,
    /// Sum of the frozen fines.
    pub total_fines: f64,
}

/// Fine owed for a loan whose agreed return date is `return_date`, computed as
/// of `today`. Return dates on or after today cost nothing.
pub fn compute_fine(return_date: NaiveDate, today: NaiveDate) -> f64 {
    let days_late = (today - return_date).num_days();
    if days_late > 0 {
        days_late as f64 * FINE_PER_DAY
    } else {
        0.0
    }
}

/// Render an amount the way the dashboard shows money.
pub fn format_money(amount: f64) -> String {
    format!("R{amount:.2}")
}
