//! Catalog queries: what can be lent, the full list of books, and the helpers
//! used to populate a fresh database.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::models::Item;

/// Titles inserted by [`seed_catalog`] when the catalog is empty.
const SAMPLE_CATALOG: &[(&str, i64)] = &[
    ("Things Fall Apart", 3),
    ("Cry, the Beloved Country", 2),
    ("The Hobbit", 4),
    ("Long Walk to Freedom", 1),
    ("Animal Farm", 2),
];

/// Every item with at least one copy on the shelf, in insertion order. The
/// borrow form only ever offers entries from this list.
pub fn fetch_available_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn
        .prepare("SELECT id, title, quantity FROM books WHERE quantity > 0 ORDER BY id")
        .context("failed to prepare available books query")?;

    let items = stmt
        .query_map([], |row| {
            Ok(Item {
                id: row.get(0)?,
                title: row.get(1)?,
                quantity: row.get(2)?,
            })
        })
        .context("failed to iterate available books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect available books")?;

    debug!(count = items.len(), "loaded available books");
    Ok(items)
}

/// Look up one catalog entry by id.
pub fn find_item(conn: &Connection, item_id: i64) -> Result<Option<Item>> {
    conn.query_row(
        "SELECT id, title, quantity FROM books WHERE id = ?1",
        params![item_id],
        |row| {
            Ok(Item {
                id: row.get(0)?,
                title: row.get(1)?,
                quantity: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to load book")
}

/// The whole catalog, including titles with no copy left.
pub fn fetch_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn
        .prepare("SELECT id, title, quantity FROM books ORDER BY id")
        .context("failed to prepare books query")?;

    let items = stmt
        .query_map([], |row| {
            Ok(Item {
                id: row.get(0)?,
                title: row.get(1)?,
                quantity: row.get(2)?,
            })
        })
        .context("failed to iterate books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect books")?;

    Ok(items)
}

/// Add a catalog entry and return it hydrated.
pub fn create_item(conn: &Connection, title: &str, quantity: i64) -> Result<Item> {
    let title = title.trim();
    if title.is_empty() {
        return Err(LedgerError::MissingTitle.into());
    }
    if quantity < 0 {
        return Err(LedgerError::NegativeQuantity.into());
    }

    conn.execute(
        "INSERT INTO books (title, quantity) VALUES (?1, ?2)",
        params![title, quantity],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    info!(id, title, quantity, "added book to catalog");
    Ok(Item {
        id,
        title: title.to_string(),
        quantity,
    })
}

/// Insert the sample catalog, but only into an empty `books` table. Returns
/// how many entries were written.
pub fn seed_catalog(conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction().context("failed to start seed transaction")?;

    let existing: i64 = tx
        .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
        .context("failed to count books")?;
    if existing > 0 {
        debug!(existing, "catalog already populated, skipping seed");
        return Ok(0);
    }

    for (title, quantity) in SAMPLE_CATALOG {
        tx.execute(
            "INSERT INTO books (title, quantity) VALUES (?1, ?2)",
            params![title, quantity],
        )
        .context("failed to insert sample book")?;
    }
    tx.commit().context("failed to commit sample catalog")?;

    info!(count = SAMPLE_CATALOG.len(), "seeded sample catalog");
    Ok(SAMPLE_CATALOG.len())
}
