//! Dashboard counters.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::models::LedgerStats;

/// Compute the four dashboard counters. Each figure is its own query; nothing
/// ties them to a single snapshot.
pub fn fetch_stats(conn: &Connection, today: NaiveDate) -> Result<LedgerStats> {
    let total_available: Option<i64> = conn
        .query_row("SELECT SUM(quantity) FROM books", [], |row| row.get(0))
        .context("failed to sum available books")?;

    let total_borrowed: i64 = conn
        .query_row("SELECT COUNT(*) FROM borrowed_books", [], |row| row.get(0))
        .context("failed to count loan records")?;

    let overdue_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM borrowed_books WHERE date(return_date) < date(?1)",
            params![today],
            |row| row.get(0),
        )
        .context("failed to count overdue loans")?;

    let total_fines: Option<f64> = conn
        .query_row("SELECT SUM(fine) FROM borrowed_books", [], |row| row.get(0))
        .context("failed to sum fines")?;

    let stats = LedgerStats {
        total_available: total_available.unwrap_or(0),
        total_borrowed,
        overdue_count,
        total_fines: total_fines.unwrap_or(0.0),
    };
    debug!(?stats, "computed ledger stats");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::memory_ledger;
    use crate::db::items::create_item;
    use crate::db::loans::create_loan;
    use crate::models::NewLoan;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_ledger_reports_zeroes() {
        let conn = memory_ledger();
        assert_eq!(
            fetch_stats(&conn, date("2024-01-10")).unwrap(),
            LedgerStats::default()
        );
    }

    #[test]
    fn overdue_is_evaluated_at_query_time() {
        let mut conn = memory_ledger();
        let book = create_item(&conn, "Dune", 3).unwrap();
        let loan = NewLoan {
            borrower_name: "Ann".to_string(),
            item_id: book.id,
            borrow_date: date("2024-01-10"),
            return_date: date("2024-01-12"),
        };
        create_loan(&mut conn, &loan, date("2024-01-10")).unwrap();

        let before = fetch_stats(&conn, date("2024-01-12")).unwrap();
        assert_eq!(before.overdue_count, 0);

        let after = fetch_stats(&conn, date("2024-01-13")).unwrap();
        assert_eq!(after.overdue_count, 1);
        // fines stay frozen at the creation-time figure
        assert_eq!(after.total_fines, 0.0);
        assert_eq!(after.total_available, 2);
        assert_eq!(after.total_borrowed, 1);
    }
}
