//! Loan records. Creating and deleting a loan each move one copy between the
//! shelf and the borrower, so both run inside a single transaction that also
//! touches `books`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::models::{compute_fine, LoanRecord, LoanRow, NewLoan};

/// Lend one copy of `loan.item_id`. The fine is computed from the return date
/// as of `today` and stored with the record.
///
/// The stock decrement and the insert share one transaction. The decrement only
/// applies while a copy is left, so an empty shelf (or an unknown id) rolls the
/// whole thing back with [`LedgerError::ItemUnavailable`].
pub fn create_loan(conn: &mut Connection, loan: &NewLoan, today: NaiveDate) -> Result<LoanRecord> {
    let fine = compute_fine(loan.return_date, today);
    let tx = conn.transaction().context("failed to start loan transaction")?;

    let decremented = tx
        .execute(
            "UPDATE books SET quantity = quantity - 1 WHERE id = ?1 AND quantity > 0",
            params![loan.item_id],
        )
        .context("failed to decrement book quantity")?;
    if decremented == 0 {
        warn!(item_id = loan.item_id, "refused loan for unavailable book");
        return Err(LedgerError::ItemUnavailable {
            item_id: loan.item_id,
        }
        .into());
    }

    tx.execute(
        "INSERT INTO borrowed_books (student_name, book_id, borrow_date, return_date, fine)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            loan.borrower_name,
            loan.item_id,
            loan.borrow_date,
            loan.return_date,
            fine
        ],
    )
    .context("failed to insert loan record")?;
    let id = tx.last_insert_rowid();

    tx.commit().context("failed to commit loan")?;

    info!(id, item_id = loan.item_id, borrower = %loan.borrower_name, fine, "recorded loan");
    Ok(LoanRecord {
        id,
        borrower_name: loan.borrower_name.clone(),
        item_id: loan.item_id,
        borrow_date: loan.borrow_date,
        return_date: loan.return_date,
        fine,
    })
}

/// Remove a loan record and put its copy back on the shelf. Returns `false`
/// without touching anything when no record has that id.
pub fn delete_loan(conn: &mut Connection, record_id: i64) -> Result<bool> {
    let tx = conn.transaction().context("failed to start delete transaction")?;

    let item_id: Option<i64> = tx
        .query_row(
            "SELECT book_id FROM borrowed_books WHERE id = ?1",
            params![record_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up loan record")?;

    let Some(item_id) = item_id else {
        debug!(record_id, "no loan record to delete");
        return Ok(false);
    };

    tx.execute(
        "DELETE FROM borrowed_books WHERE id = ?1",
        params![record_id],
    )
    .context("failed to delete loan record")?;
    tx.execute(
        "UPDATE books SET quantity = quantity + 1 WHERE id = ?1",
        params![item_id],
    )
    .context("failed to restore book quantity")?;

    tx.commit().context("failed to commit loan deletion")?;

    info!(record_id, item_id, "deleted loan record");
    Ok(true)
}

/// Fetch a single loan record by id.
pub fn find_loan(conn: &Connection, record_id: i64) -> Result<Option<LoanRecord>> {
    conn.query_row(
        "SELECT id, student_name, book_id, borrow_date, return_date, fine
         FROM borrowed_books WHERE id = ?1",
        params![record_id],
        |row| {
            Ok(LoanRecord {
                id: row.get(0)?,
                borrower_name: row.get(1)?,
                item_id: row.get(2)?,
                borrow_date: row.get(3)?,
                return_date: row.get(4)?,
                fine: row.get(5)?,
            })
        },
    )
    .optional()
    .context("failed to load loan record")
}

/// Every loan joined with its book title, newest first. A non-empty `search`
/// keeps only rows whose borrower or title contains it, ignoring case; the
/// filter runs after the fetch.
pub fn fetch_loans(conn: &Connection, search: &str) -> Result<Vec<LoanRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT bb.id, bb.student_name, bk.title, bb.borrow_date, bb.return_date, bb.fine
             FROM borrowed_books bb
             JOIN books bk ON bb.book_id = bk.id
             ORDER BY bb.id DESC",
        )
        .context("failed to prepare loans query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(LoanRow {
                id: row.get(0)?,
                borrower_name: row.get(1)?,
                item_title: row.get(2)?,
                borrow_date: row.get(3)?,
                return_date: row.get(4)?,
                fine: row.get(5)?,
            })
        })
        .context("failed to iterate loans")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect loans")?;

    let search = search.trim();
    if search.is_empty() {
        return Ok(rows);
    }
    Ok(rows
        .into_iter()
        .filter(|row| row.matches_search(search))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::memory_ledger;
    use crate::db::items::{create_item, fetch_available_items};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn quantity(conn: &Connection, item_id: i64) -> i64 {
        conn.query_row(
            "SELECT quantity FROM books WHERE id = ?1",
            [item_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn loan(borrower: &str, item_id: i64, ret: &str) -> NewLoan {
        NewLoan {
            borrower_name: borrower.to_string(),
            item_id,
            borrow_date: date("2024-01-01"),
            return_date: date(ret),
        }
    }

    #[test]
    fn create_loan_freezes_fine_and_decrements_stock() {
        let mut conn = memory_ledger();
        let book = create_item(&conn, "Dune", 2).unwrap();

        let late = create_loan(&mut conn, &loan("Ann", book.id, "2024-01-05"), date("2024-01-10"))
            .unwrap();
        let on_time =
            create_loan(&mut conn, &loan("Ben", book.id, "2024-01-10"), date("2024-01-10"))
                .unwrap();

        assert_eq!(late.fine, 25.0);
        assert_eq!(on_time.fine, 0.0);
        assert_eq!(quantity(&conn, book.id), 0);
        assert_eq!(find_loan(&conn, late.id).unwrap(), Some(late));
    }

    #[test]
    fn create_loan_on_empty_shelf_changes_nothing() {
        let mut conn = memory_ledger();
        let book = create_item(&conn, "Emma", 0).unwrap();

        let err = create_loan(&mut conn, &loan("Ann", book.id, "2024-01-12"), date("2024-01-10"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::ItemUnavailable { item_id: book.id })
        );
        assert_eq!(quantity(&conn, book.id), 0);
        assert!(fetch_loans(&conn, "").unwrap().is_empty());
        assert!(fetch_available_items(&conn).unwrap().is_empty());
    }

    #[test]
    fn create_loan_for_unknown_book_is_rejected() {
        let mut conn = memory_ledger();
        let err = create_loan(&mut conn, &loan("Ann", 99, "2024-01-12"), date("2024-01-10"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::ItemUnavailable { item_id: 99 })
        ));
    }

    #[test]
    fn delete_twice_restores_stock_once() {
        let mut conn = memory_ledger();
        let book = create_item(&conn, "Dune", 1).unwrap();
        let record =
            create_loan(&mut conn, &loan("Ann", book.id, "2024-01-12"), date("2024-01-10"))
                .unwrap();
        assert_eq!(quantity(&conn, book.id), 0);

        assert!(delete_loan(&mut conn, record.id).unwrap());
        assert_eq!(quantity(&conn, book.id), 1);

        assert!(!delete_loan(&mut conn, record.id).unwrap());
        assert_eq!(quantity(&conn, book.id), 1);
        assert_eq!(find_loan(&conn, record.id).unwrap(), None);
    }

    #[test]
    fn fetch_loans_is_newest_first_and_filters_case_insensitively() {
        let mut conn = memory_ledger();
        let hobbit = create_item(&conn, "The Hobbit", 5).unwrap();
        let dune = create_item(&conn, "Dune", 5).unwrap();
        let today = date("2024-01-01");

        create_loan(&mut conn, &loan("Thandi", hobbit.id, "2024-01-05"), today).unwrap();
        create_loan(&mut conn, &loan("Sipho", dune.id, "2024-01-05"), today).unwrap();
        create_loan(&mut conn, &loan("Lerato", dune.id, "2024-01-05"), today).unwrap();

        let all = fetch_loans(&conn, "").unwrap();
        let borrowers: Vec<&str> = all.iter().map(|r| r.borrower_name.as_str()).collect();
        assert_eq!(borrowers, vec!["Lerato", "Sipho", "Thandi"]);

        let by_title = fetch_loans(&conn, "DUNE").unwrap();
        assert_eq!(by_title.len(), 2);
        let by_name = fetch_loans(&conn, "thand").unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].item_title, "The Hobbit");
        assert!(fetch_loans(&conn, "nobody").unwrap().is_empty());
    }
}
