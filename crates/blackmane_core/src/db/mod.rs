//! Connection bootstrap for the architecture model store.
//!
//! # Responsibility
//! - Hand out connections with `foreign_keys=ON` and a 5 s busy timeout.
//! - Bring the file to the latest schema before any repository touches it.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the number of applied migrations; a file
//!   written by a newer build is refused, never downgraded.
//! - Ownership cascades (project → architecture → zone → component → flow)
//!   and same-architecture references are compound foreign keys, so they hold
//!   for every writer on a connection opened here.
//! - Analysis findings outlive the components and flows they cite; those
//!   references are nulled on delete.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or migrating the store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file carries a schema this build does not know.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "model store sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "model store schema version {db_version} is newer than supported {latest_supported}; refusing to open"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn newer_schema_message_names_both_versions() {
        let err = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        let message = err.to_string();
        assert!(message.contains("version 9"));
        assert!(message.contains("supported 2"));
        assert!(err.source().is_none());
    }

    #[test]
    fn sqlite_error_keeps_its_source() {
        let err = DbError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().starts_with("model store sqlite error"));
        assert!(err.source().is_some());
    }
}
