use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".lending-ledger";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.db";
/// Log file the dashboard writes to while it owns the terminal.
const LOG_FILE_NAME: &str = "lending-ledger.log";

/// Runtime settings resolved once at startup from flags, environment and the
/// home directory.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Fill in whatever the command line left out with the defaults under the
    /// user's home.
    pub fn resolve(db_path: Option<PathBuf>, log_level: &str) -> Result<Self> {
        let data_dir = match &db_path {
            Some(path) => path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            None => data_dir()?,
        };
        let db_path = db_path.unwrap_or_else(|| data_dir.join(DB_FILE_NAME));

        Ok(Self {
            db_path,
            log_path: data_dir.join(LOG_FILE_NAME),
            log_level: log_level.to_string(),
        })
    }
}

/// Resolve the absolute path of the data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// The local calendar date. Fines and overdue checks are all relative to it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_database_keeps_log_alongside() {
        let settings =
            Settings::resolve(Some(PathBuf::from("/tmp/ledger/books.db")), "debug").unwrap();
        assert_eq!(settings.db_path, PathBuf::from("/tmp/ledger/books.db"));
        assert_eq!(
            settings.log_path,
            PathBuf::from("/tmp/ledger").join(LOG_FILE_NAME)
        );
        assert_eq!(settings.log_level, "debug");
    }
}
