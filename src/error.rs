//! Domain errors. Store faults travel as `anyhow` errors with context; the
//! variants here are the outcomes a user can fix, and their messages are shown
//! verbatim in the dashboard and on the command line.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Student name is required.")]
    MissingBorrower,

    #[error("Borrow date cannot be in the past.")]
    BorrowDateInPast,

    #[error("Return date cannot be before borrow date.")]
    ReturnBeforeBorrow,

    #[error("Select a book.")]
    NoItemSelected,

    #[error("{field} must be a date (YYYY-MM-DD).")]
    InvalidDate { field: &'static str, value: String },

    #[error("Enter a valid record ID (>0).")]
    InvalidRecordId,

    /// Raised from inside the create-loan transaction when the item has no
    /// copy left (or does not exist).
    #[error("Book {item_id} is not available to borrow.")]
    ItemUnavailable { item_id: i64 },

    #[error("Book title is required.")]
    MissingTitle,

    #[error("Quantity cannot be negative.")]
    NegativeQuantity,
}
