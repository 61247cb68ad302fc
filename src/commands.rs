//! Non-interactive front door. Every handler opens its own connection, runs
//! one operation and prints the outcome to `out`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::db::{
    create_item, create_loan, delete_loan, fetch_available_items, fetch_items, fetch_loans,
    fetch_stats, find_item, find_loan, seed_catalog, Store,
};
use crate::models::format_money;
use crate::validation::{validate_record_id, LoanRequest};

pub fn stats(store: &Store, today: NaiveDate, out: &mut impl Write) -> Result<()> {
    let conn = store.connect()?;
    let stats = fetch_stats(&conn, today)?;
    writeln!(out, "Total Available Books: {}", stats.total_available)?;
    writeln!(out, "Borrowed Records:      {}", stats.total_borrowed)?;
    writeln!(out, "Overdue:               {}", stats.overdue_count)?;
    writeln!(out, "Total Fines:           {}", format_money(stats.total_fines))?;
    Ok(())
}

pub fn available(store: &Store, out: &mut impl Write) -> Result<()> {
    let conn = store.connect()?;
    let items = fetch_available_items(&conn)?;
    if items.is_empty() {
        writeln!(out, "No books available to borrow.")?;
    }
    for item in items {
        writeln!(out, "{:>4}  {item}  ({} left)", item.id, item.quantity)?;
    }
    Ok(())
}

pub fn items(store: &Store, out: &mut impl Write) -> Result<()> {
    let conn = store.connect()?;
    for item in fetch_items(&conn)? {
        writeln!(out, "{:>4}  {:>3}  {item}", item.id, item.quantity)?;
    }
    Ok(())
}

pub fn add_item(store: &Store, title: &str, quantity: i64, out: &mut impl Write) -> Result<()> {
    let conn = store.connect()?;
    let item = create_item(&conn, title, quantity)?;
    writeln!(out, "Added '{}' as book {} ({} copies).", item.title, item.id, item.quantity)?;
    Ok(())
}

pub fn seed(store: &Store, out: &mut impl Write) -> Result<()> {
    let mut conn = store.connect()?;
    let inserted = seed_catalog(&mut conn)?;
    if inserted == 0 {
        writeln!(out, "Catalog already has books; nothing seeded.")?;
    } else {
        writeln!(out, "Seeded {inserted} books.")?;
    }
    Ok(())
}

pub fn loans(store: &Store, search: &str, today: NaiveDate, out: &mut impl Write) -> Result<()> {
    let conn = store.connect()?;
    let rows = fetch_loans(&conn, search)?;
    writeln!(out, "Total Records: {}", rows.len())?;
    if rows.is_empty() {
        writeln!(out, "No records to show.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:>4}  {:<20}  {:<28}  {:<10}  {:<10}  {:>8}",
        "ID", "Student", "Book", "Borrowed", "Due", "Fine"
    )?;
    for row in rows {
        let marker = if row.is_overdue(today) { "  OVERDUE" } else { "" };
        writeln!(
            out,
            "{:>4}  {:<20}  {:<28}  {:<10}  {:<10}  {:>8}{}",
            row.id,
            row.borrower_name,
            row.item_title,
            row.borrow_date.to_string(),
            row.return_date.to_string(),
            format_money(row.fine),
            marker
        )?;
    }
    Ok(())
}

pub fn borrow(
    store: &Store,
    request: LoanRequest,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<()> {
    let loan = request.validate(today)?;
    let mut conn = store.connect()?;
    let record = create_loan(&mut conn, &loan, today).context("could not record the loan")?;
    let title = match find_item(&conn, record.item_id)? {
        Some(item) => item.to_string(),
        None => format!("book {}", record.item_id),
    };
    info!(record_id = record.id, "loan recorded from the command line");
    writeln!(
        out,
        "'{title}' borrowed for {} (record {}).",
        record.borrower_name, record.id
    )?;
    Ok(())
}

pub fn delete(store: &Store, record_id: i64, out: &mut impl Write) -> Result<()> {
    let record_id = validate_record_id(record_id)?;
    let mut conn = store.connect()?;
    let Some(record) = find_loan(&conn, record_id)? else {
        writeln!(out, "Record ID not found.")?;
        return Ok(());
    };
    if delete_loan(&mut conn, record_id)? {
        writeln!(
            out,
            "Record {record_id} deleted; {}'s copy is back on the shelf.",
            record.borrower_name
        )?;
    } else {
        writeln!(out, "Record ID not found.")?;
    }
    Ok(())
}
