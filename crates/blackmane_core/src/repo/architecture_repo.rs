//! Architecture repository contract and SQLite implementation.
//!
//! # Invariants
//! - `architectures.project_id` is UNIQUE in the schema. A second insert for
//!   the same project fails with a constraint error even when two callers
//!   raced past a read-side check.

use crate::model::architecture::{
    Architecture, ArchitectureId, ArchitecturePatch, NewArchitecture,
};
use crate::model::page::PageRequest;
use crate::model::project::ProjectId;
use crate::repo::{
    count_rows, delete_row, ensure_table_ready, optional_text_value, page_values, parse_uuid,
    row_exists, Assignments, RepoError, RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const ARCHITECTURE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    description,
    created_at,
    updated_at
FROM architectures";

const ARCHITECTURE_COLUMNS: &[&str] = &[
    "id",
    "project_id",
    "description",
    "created_at",
    "updated_at",
];

/// Repository interface for architecture persistence.
pub trait ArchitectureRepository {
    fn create(&self, input: &NewArchitecture) -> RepoResult<Architecture>;
    fn get_by_id(&self, id: ArchitectureId) -> RepoResult<Option<Architecture>>;
    /// Loads the single architecture of a project, if any.
    fn get_by_project(&self, project_id: ProjectId) -> RepoResult<Option<Architecture>>;
    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Architecture>>;
    fn update(
        &self,
        id: ArchitectureId,
        patch: &ArchitecturePatch,
    ) -> RepoResult<Option<Architecture>>;
    /// Deletes the architecture with every zone, component and flow it owns.
    fn delete(&self, id: ArchitectureId) -> RepoResult<bool>;
    fn exists(&self, id: ArchitectureId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed architecture repository.
pub struct SqliteArchitectureRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArchitectureRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "architectures", ARCHITECTURE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ArchitectureRepository for SqliteArchitectureRepository<'_> {
    fn create(&self, input: &NewArchitecture) -> RepoResult<Architecture> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO architectures (id, project_id, description)
             VALUES (?1, ?2, ?3);",
            params![
                id.to_string(),
                input.project_id.to_string(),
                input.description.as_deref(),
            ],
        )?;
        let architecture = load_architecture(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "architecture {id} missing from read-back after insert"
            ))
        })?;
        tx.commit()?;
        Ok(architecture)
    }

    fn get_by_id(&self, id: ArchitectureId) -> RepoResult<Option<Architecture>> {
        load_architecture(self.conn, id)
    }

    fn get_by_project(&self, project_id: ProjectId) -> RepoResult<Option<Architecture>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARCHITECTURE_SELECT_SQL} WHERE project_id = ?1;"))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_architecture_row(row)?));
        }
        Ok(None)
    }

    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Architecture>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARCHITECTURE_SELECT_SQL}
             ORDER BY rowid ASC
             LIMIT ? OFFSET ?;"
        ))?;
        let mut rows = stmt.query(params_from_iter(page_values(page)))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_architecture_row(row)?);
        }
        Ok(items)
    }

    fn update(
        &self,
        id: ArchitectureId,
        patch: &ArchitecturePatch,
    ) -> RepoResult<Option<Architecture>> {
        if patch.is_empty() {
            return load_architecture(self.conn, id);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "architectures", id)? {
            return Ok(None);
        }

        let mut assignments = Assignments::default();
        if let Some(description) = patch.description.as_ref() {
            assignments.set("description", optional_text_value(description.as_deref()));
        }
        assignments.apply(&tx, "architectures", id, true)?;

        let architecture = load_architecture(&tx, id)?;
        tx.commit()?;
        Ok(architecture)
    }

    fn delete(&self, id: ArchitectureId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = delete_row(&tx, "architectures", id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn exists(&self, id: ArchitectureId) -> RepoResult<bool> {
        row_exists(self.conn, "architectures", id)
    }

    fn count(&self) -> RepoResult<u64> {
        count_rows(self.conn, "SELECT COUNT(*) FROM architectures;", [])
    }
}

fn load_architecture(conn: &Connection, id: ArchitectureId) -> RepoResult<Option<Architecture>> {
    let mut stmt = conn.prepare(&format!("{ARCHITECTURE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_architecture_row(row)?));
    }
    Ok(None)
}

fn parse_architecture_row(row: &Row<'_>) -> RepoResult<Architecture> {
    let id_text: String = row.get("id")?;
    let project_text: String = row.get("project_id")?;
    Ok(Architecture {
        id: parse_uuid(&id_text, "architectures.id")?,
        project_id: parse_uuid(&project_text, "architectures.project_id")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
