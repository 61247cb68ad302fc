use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Handle on the on-disk ledger. It only remembers where the database lives;
/// every interaction opens its own connection through [`Store::connect`] and
/// drops it when done.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Create the parent directory if needed, make sure both tables exist, and
    /// return a handle for later connections.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let conn = store.connect()?;
        ensure_schema(&conn)?;
        Ok(store)
    }

    /// Open a fresh connection with foreign keys enforced.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).with_context(|| {
            format!("failed to open SQLite database at {}", self.path.display())
        })?;
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("failed to enable foreign keys")?;
        debug!(path = %self.path.display(), "opened ledger connection");
        Ok(conn)
    }

    /// Location of the SQLite file, as given to [`Store::open`].
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create the catalog and loan tables when they are missing. Table and column
/// names match the library database the dashboard has always used, so an
/// existing `library.db` opens unchanged.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS borrowed_books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT NOT NULL,
            book_id INTEGER NOT NULL,
            borrow_date TEXT NOT NULL,
            return_date TEXT NOT NULL,
            fine REAL NOT NULL DEFAULT 0,
            FOREIGN KEY(book_id) REFERENCES books(id)
        )",
        [],
    )
    .context("failed to create borrowed_books table")?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn memory_ledger() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
    ensure_schema(&conn).unwrap();
    conn
}
