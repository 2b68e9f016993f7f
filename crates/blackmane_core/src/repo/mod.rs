//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - One repository per entity type: create, by-id, by-parent pages,
//!   partial update, delete, existence and count probes.
//! - Isolate SQL details from service/business orchestration.
//!
//! # Invariants
//! - Repositories never produce domain failures. Absence is `Ok(None)` or
//!   `Ok(false)`; services decide what absence means.
//! - Every mutation runs inside one IMMEDIATE transaction, so a failed
//!   statement (including cascades) leaves no partial writes.
//! - Repository construction fails fast when the connection is not migrated.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod architecture_repo;
pub mod component_repo;
pub mod flow_repo;
pub mod project_repo;
pub mod zone_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error shared by all entity repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid entity view.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether the store rejected a write on a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        self.constraint_extended_code() == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    }

    /// Returns whether the store rejected a write on a FOREIGN KEY constraint.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.constraint_extended_code() == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
    }

    fn constraint_extended_code(&self) -> Option<i32> {
        match self {
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Some(err.extended_code)
            }
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column assignments collected from a partial update.
///
/// Only fields present in the patch are pushed, so omitted fields keep their
/// stored value.
#[derive(Debug, Default)]
pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Assignments {
    pub(crate) fn set(&mut self, column: &'static str, value: Value) {
        self.columns.push(column);
        self.values.push(value);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Runs `UPDATE <table> SET ... WHERE id = ?` and returns changed rows.
    pub(crate) fn apply(
        self,
        conn: &Connection,
        table: &'static str,
        id: Uuid,
        touch_updated_at: bool,
    ) -> RepoResult<usize> {
        let mut fragments: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect();
        if touch_updated_at {
            fragments.push("updated_at = (strftime('%s', 'now') * 1000)".to_string());
        }

        let sql = format!("UPDATE {table} SET {} WHERE id = ?;", fragments.join(", "));
        let mut bind_values = self.values;
        bind_values.push(Value::Text(id.to_string()));

        let changed = conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }
}

pub(crate) fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn optional_text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text_value)
}

pub(crate) fn bool_value(value: bool) -> Value {
    Value::Integer(bool_to_int(value))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// Builds the `LIMIT ? OFFSET ?` bind values for one page.
pub(crate) fn page_values(page: crate::model::page::PageRequest) -> [Value; 2] {
    [
        Value::Integer(i64::from(page.applied_limit())),
        Value::Integer(i64::from(page.offset)),
    ]
}

pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn delete_row(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<bool> {
    let changed = conn.execute(
        &format!("DELETE FROM {table} WHERE id = ?1;"),
        [id.to_string()],
    )?;
    Ok(changed > 0)
}

pub(crate) fn count_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<u64> {
    let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}

/// Counts rows of `table` owned by one architecture.
pub(crate) fn count_in_architecture(
    conn: &Connection,
    table: &'static str,
    architecture_id: Uuid,
) -> RepoResult<u64> {
    count_rows(
        conn,
        &format!("SELECT COUNT(*) FROM {table} WHERE architecture_id = ?1;"),
        [architecture_id.to_string()],
    )
}

/// Runs `insert` inside one IMMEDIATE transaction.
pub(crate) fn insert_in_transaction<T, F>(conn: &Connection, insert: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let inserted = insert(&tx)?;
    tx.commit()?;
    Ok(inserted)
}

/// Runs `insert` unless the architecture already owns `limit` rows of
/// `table`; `Ok(None)` in that case.
///
/// The count and the insert run under one write lock.
pub(crate) fn insert_within_limit<T, F>(
    conn: &Connection,
    table: &'static str,
    architecture_id: Uuid,
    limit: u32,
    insert: F,
) -> RepoResult<Option<T>>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if count_in_architecture(&tx, table, architecture_id)? >= u64::from(limit) {
        return Ok(None);
    }
    let inserted = insert(&tx)?;
    tx.commit()?;
    Ok(Some(inserted))
}

/// Checks that `conn` is migrated and `table` carries every column in
/// `columns`.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_uuid, RepoError};
    use crate::db::DbError;

    #[test]
    fn parse_bool_rejects_out_of_range_values() {
        assert!(!parse_bool(0, "t.c").unwrap());
        assert!(parse_bool(1, "t.c").unwrap());
        let err = parse_bool(2, "t.c").unwrap_err();
        assert!(err.to_string().contains("t.c"));
    }

    #[test]
    fn parse_uuid_names_the_column() {
        let err = parse_uuid("not-a-uuid", "zones.id").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("zones.id")));
    }

    #[test]
    fn constraint_checks_ignore_other_errors() {
        let err = RepoError::Db(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }
}
