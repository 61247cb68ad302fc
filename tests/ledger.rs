//! Ledger behavior against a real database file.
//!
//! Each test opens a fresh store inside a temporary directory and goes through
//! the same public functions the dashboard and the command line use.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use tempfile::TempDir;

use lending_ledger::{
    create_item, create_loan, delete_loan, fetch_available_items, fetch_loans, fetch_stats,
    LedgerError, LedgerStats, NewLoan, Store,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn open_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("library.db")).unwrap();
    (dir, store)
}

fn loan(borrower: &str, item_id: i64, return_date: NaiveDate) -> NewLoan {
    NewLoan {
        borrower_name: borrower.to_string(),
        item_id,
        borrow_date: today(),
        return_date,
    }
}

fn quantity(conn: &Connection, item_id: i64) -> i64 {
    conn.query_row(
        "SELECT quantity FROM books WHERE id = ?1",
        [item_id],
        |row| row.get(0),
    )
    .unwrap()
}

fn loan_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM borrowed_books", [], |row| row.get(0))
        .unwrap()
}

/// Quantity always equals the starting stock minus creates plus deletes.
#[test]
fn test_inventory_conservation() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let book = create_item(&conn, "Things Fall Apart", 5).unwrap();

    let mut outstanding = Vec::new();
    let mut creates = 0;
    let mut deletes = 0;
    for step in 0..12 {
        if step % 3 == 2 {
            let id = outstanding.remove(0);
            assert!(delete_loan(&mut conn, id).unwrap());
            deletes += 1;
        } else {
            let record = create_loan(
                &mut conn,
                &loan(&format!("student {step}"), book.id, today()),
                today(),
            )
            .unwrap();
            outstanding.push(record.id);
            creates += 1;
        }
        assert_eq!(quantity(&conn, book.id), 5 - creates + deletes);
    }
    assert_eq!(loan_count(&conn), creates - deletes);
}

/// A fault while inserting the record must undo the stock decrement.
#[test]
fn test_create_rolls_back_on_insert_failure() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let book = create_item(&conn, "Dune", 2).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_loans BEFORE INSERT ON borrowed_books
         BEGIN SELECT RAISE(ABORT, 'loans are frozen'); END;",
    )
    .unwrap();

    assert!(create_loan(&mut conn, &loan("Ann", book.id, today()), today()).is_err());
    assert_eq!(quantity(&conn, book.id), 2);
    assert_eq!(loan_count(&conn), 0);
}

/// A fault while restoring stock must keep the record in place.
#[test]
fn test_delete_rolls_back_on_restock_failure() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let book = create_item(&conn, "Dune", 1).unwrap();
    let record = create_loan(&mut conn, &loan("Ann", book.id, today()), today()).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER freeze_stock BEFORE UPDATE ON books
         BEGIN SELECT RAISE(ABORT, 'stock is frozen'); END;",
    )
    .unwrap();

    assert!(delete_loan(&mut conn, record.id).is_err());
    assert_eq!(loan_count(&conn), 1);
    assert_eq!(quantity(&conn, book.id), 0);
}

/// Fines: five per full day the return date lies before the creation date.
#[test]
fn test_fine_computation() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let book = create_item(&conn, "Emma", 3).unwrap();

    let late = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let record = create_loan(&mut conn, &loan("Ann", book.id, late), today()).unwrap();
    assert_eq!(record.fine, 25.0);

    let record = create_loan(&mut conn, &loan("Ben", book.id, today()), today()).unwrap();
    assert_eq!(record.fine, 0.0);

    let later = today() + Duration::days(7);
    let record = create_loan(&mut conn, &loan("Cara", book.id, later), today()).unwrap();
    assert_eq!(record.fine, 0.0);
}

/// Deleting the same record twice only restores one copy.
#[test]
fn test_delete_then_fail() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let book = create_item(&conn, "Beloved", 1).unwrap();
    let record = create_loan(&mut conn, &loan("Ann", book.id, today()), today()).unwrap();

    assert!(delete_loan(&mut conn, record.id).unwrap());
    assert_eq!(quantity(&conn, book.id), 1);
    assert!(!delete_loan(&mut conn, record.id).unwrap());
    assert_eq!(quantity(&conn, book.id), 1);
}

/// The four counters over a mixed catalog and loan book.
#[test]
fn test_aggregate_stats() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let stocked = create_item(&conn, "The Hobbit", 3).unwrap();
    let single = create_item(&conn, "Long Walk to Freedom", 1).unwrap();

    let yesterday = today() - Duration::days(1);
    let tomorrow = today() + Duration::days(1);
    // written four days from now so the frozen fine is five days' worth
    let overdue = create_loan(
        &mut conn,
        &loan("Ann", stocked.id, yesterday),
        today() + Duration::days(4),
    )
    .unwrap();
    assert_eq!(overdue.fine, 25.0);
    create_loan(&mut conn, &loan("Ben", single.id, tomorrow), today()).unwrap();

    assert_eq!(quantity(&conn, stocked.id), 2);
    assert_eq!(quantity(&conn, single.id), 0);
    assert_eq!(
        fetch_stats(&conn, today()).unwrap(),
        LedgerStats {
            total_available: 2,
            total_borrowed: 2,
            overdue_count: 1,
            total_fines: 25.0,
        }
    );
}

/// An item with no copy left is neither offered nor lendable.
#[test]
fn test_empty_shelf_is_not_lendable() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let gone = create_item(&conn, "Animal Farm", 0).unwrap();
    let kept = create_item(&conn, "Dune", 1).unwrap();

    let offered: Vec<i64> = fetch_available_items(&conn)
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(offered, vec![kept.id]);

    let err = create_loan(&mut conn, &loan("Ann", gone.id, today()), today()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::ItemUnavailable { item_id: gone.id })
    );
    assert_eq!(quantity(&conn, gone.id), 0);
}

/// Search runs over the borrower and the joined book title, ignoring case.
#[test]
fn test_search_over_borrower_and_title() {
    let (_dir, store) = open_store();
    let mut conn = store.connect().unwrap();
    let hobbit = create_item(&conn, "The Hobbit", 2).unwrap();
    let dune = create_item(&conn, "Dune", 2).unwrap();
    create_loan(&mut conn, &loan("Hobbes", dune.id, today()), today()).unwrap();
    create_loan(&mut conn, &loan("Zanele", hobbit.id, today()), today()).unwrap();
    create_loan(&mut conn, &loan("Pieter", dune.id, today()), today()).unwrap();

    let hits: Vec<String> = fetch_loans(&conn, "HOBB")
        .unwrap()
        .into_iter()
        .map(|row| row.borrower_name)
        .collect();
    assert_eq!(hits, vec!["Zanele", "Hobbes"]);
}

/// Data written through one connection is visible through the next.
#[test]
fn test_connections_are_per_interaction() {
    let (_dir, store) = open_store();
    {
        let conn = store.connect().unwrap();
        create_item(&conn, "Dune", 1).unwrap();
    }
    let conn = store.connect().unwrap();
    assert_eq!(fetch_available_items(&conn).unwrap().len(), 1);
}
