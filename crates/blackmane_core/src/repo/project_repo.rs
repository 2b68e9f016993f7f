//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist and query root `projects` rows.
//! - Deleting a project removes its architecture subtree and analyses via
//!   schema cascades.

use crate::model::page::PageRequest;
use crate::model::project::{
    CriticalityLevel, NewProject, Project, ProjectId, ProjectPatch, ProjectType,
};
use crate::repo::{
    count_rows, delete_row, ensure_table_ready, optional_text_value, page_values, parse_uuid,
    row_exists, text_value, Assignments, RepoError, RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    project_type,
    business_context,
    criticality_level,
    created_at,
    updated_at
FROM projects";

const PROJECT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "project_type",
    "business_context",
    "criticality_level",
    "created_at",
    "updated_at",
];

/// Repository interface for project persistence.
pub trait ProjectRepository {
    /// Inserts a project with a fresh id and returns the stored row.
    fn create(&self, input: &NewProject) -> RepoResult<Project>;
    /// Loads one project by id.
    fn get_by_id(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects in insertion order.
    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Project>>;
    /// Applies present patch fields; `None` when the id does not exist.
    fn update(&self, id: ProjectId, patch: &ProjectPatch) -> RepoResult<Option<Project>>;
    /// Deletes one project and its descendants; `false` when absent.
    fn delete(&self, id: ProjectId) -> RepoResult<bool>;
    fn exists(&self, id: ProjectId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "projects", PROJECT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create(&self, input: &NewProject) -> RepoResult<Project> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO projects (
                id,
                name,
                project_type,
                business_context,
                criticality_level
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                input.name.as_str(),
                project_type_to_db(input.project_type),
                input.business_context.as_deref(),
                criticality_to_db(input.criticality_level),
            ],
        )?;
        let project = load_required_project(&tx, id)?;
        tx.commit()?;
        Ok(project)
    }

    fn get_by_id(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        load_project(self.conn, id)
    }

    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             ORDER BY rowid ASC
             LIMIT ? OFFSET ?;"
        ))?;
        let mut rows = stmt.query(params_from_iter(page_values(page)))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn update(&self, id: ProjectId, patch: &ProjectPatch) -> RepoResult<Option<Project>> {
        if patch.is_empty() {
            return load_project(self.conn, id);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "projects", id)? {
            return Ok(None);
        }

        let mut assignments = Assignments::default();
        if let Some(name) = patch.name.as_deref() {
            assignments.set("name", text_value(name));
        }
        if let Some(business_context) = patch.business_context.as_ref() {
            assignments.set(
                "business_context",
                optional_text_value(business_context.as_deref()),
            );
        }
        if let Some(level) = patch.criticality_level {
            assignments.set("criticality_level", text_value(criticality_to_db(level)));
        }
        assignments.apply(&tx, "projects", id, true)?;

        let project = load_project(&tx, id)?;
        tx.commit()?;
        Ok(project)
    }

    fn delete(&self, id: ProjectId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = delete_row(&tx, "projects", id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn exists(&self, id: ProjectId) -> RepoResult<bool> {
        row_exists(self.conn, "projects", id)
    }

    fn count(&self) -> RepoResult<u64> {
        count_rows(self.conn, "SELECT COUNT(*) FROM projects;", [])
    }
}

fn load_project(conn: &Connection, id: ProjectId) -> RepoResult<Option<Project>> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_project_row(row)?));
    }
    Ok(None)
}

fn load_required_project(conn: &Connection, id: ProjectId) -> RepoResult<Project> {
    load_project(conn, id)?.ok_or_else(|| {
        RepoError::InvalidData(format!("project {id} missing from read-back after insert"))
    })
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let type_text: String = row.get("project_type")?;
    let project_type = parse_project_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid project type `{type_text}` in projects.project_type"
        ))
    })?;
    let level_text: String = row.get("criticality_level")?;
    let criticality_level = parse_criticality(&level_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid criticality level `{level_text}` in projects.criticality_level"
        ))
    })?;

    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        name: row.get("name")?,
        project_type,
        business_context: row.get("business_context")?,
        criticality_level,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn project_type_to_db(value: ProjectType) -> &'static str {
    match value {
        ProjectType::Cloud => "cloud",
        ProjectType::OnPremise => "on-premise",
        ProjectType::Hybrid => "hybrid",
    }
}

fn parse_project_type(value: &str) -> Option<ProjectType> {
    match value {
        "cloud" => Some(ProjectType::Cloud),
        "on-premise" => Some(ProjectType::OnPremise),
        "hybrid" => Some(ProjectType::Hybrid),
        _ => None,
    }
}

fn criticality_to_db(value: CriticalityLevel) -> &'static str {
    match value {
        CriticalityLevel::Low => "low",
        CriticalityLevel::Medium => "medium",
        CriticalityLevel::High => "high",
        CriticalityLevel::Critical => "critical",
    }
}

fn parse_criticality(value: &str) -> Option<CriticalityLevel> {
    match value {
        "low" => Some(CriticalityLevel::Low),
        "medium" => Some(CriticalityLevel::Medium),
        "high" => Some(CriticalityLevel::High),
        "critical" => Some(CriticalityLevel::Critical),
        _ => None,
    }
}
