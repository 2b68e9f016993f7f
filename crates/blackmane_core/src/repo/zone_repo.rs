//! Trust zone repository contract and SQLite implementation.
//!
//! # Invariants
//! - Zone listings are scoped by `architecture_id` and keep insertion order.
//! - Deleting a zone removes its components and, through them, their flows.

use crate::model::architecture::ArchitectureId;
use crate::model::page::PageRequest;
use crate::model::zone::{NewZone, TrustLevel, Zone, ZoneId, ZonePatch};
use crate::repo::{
    count_in_architecture, count_rows, delete_row, ensure_table_ready, insert_in_transaction,
    insert_within_limit, optional_text_value, page_values, parse_uuid, row_exists, text_value,
    Assignments, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const ZONE_SELECT_SQL: &str = "SELECT
    id,
    architecture_id,
    name,
    trust_level,
    description,
    created_at
FROM zones";

const ZONE_COLUMNS: &[&str] = &[
    "id",
    "architecture_id",
    "name",
    "trust_level",
    "description",
    "created_at",
];

/// Repository interface for zone persistence.
pub trait ZoneRepository {
    fn create(&self, input: &NewZone) -> RepoResult<Zone>;
    /// Inserts unless the architecture already holds `limit` zones.
    fn create_within_limit(&self, input: &NewZone, limit: u32) -> RepoResult<Option<Zone>>;
    fn get_by_id(&self, id: ZoneId) -> RepoResult<Option<Zone>>;
    fn get_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> RepoResult<Vec<Zone>>;
    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Zone>>;
    fn update(&self, id: ZoneId, patch: &ZonePatch) -> RepoResult<Option<Zone>>;
    fn delete(&self, id: ZoneId) -> RepoResult<bool>;
    fn exists(&self, id: ZoneId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    fn count_by_architecture(&self, architecture_id: ArchitectureId) -> RepoResult<u64>;
}

/// SQLite-backed zone repository.
pub struct SqliteZoneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteZoneRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "zones", ZONE_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_zones(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Zone>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut zones = Vec::new();
        while let Some(row) = rows.next()? {
            zones.push(parse_zone_row(row)?);
        }
        Ok(zones)
    }
}

impl ZoneRepository for SqliteZoneRepository<'_> {
    fn create(&self, input: &NewZone) -> RepoResult<Zone> {
        insert_in_transaction(self.conn, |conn| insert_zone(conn, input))
    }

    fn create_within_limit(&self, input: &NewZone, limit: u32) -> RepoResult<Option<Zone>> {
        insert_within_limit(self.conn, "zones", input.architecture_id, limit, |conn| {
            insert_zone(conn, input)
        })
    }

    fn get_by_id(&self, id: ZoneId) -> RepoResult<Option<Zone>> {
        load_zone(self.conn, id)
    }

    fn get_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> RepoResult<Vec<Zone>> {
        let [limit, offset] = page_values(page);
        self.query_zones(
            &format!(
                "{ZONE_SELECT_SQL}
                 WHERE architecture_id = ?
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            vec![Value::Text(architecture_id.to_string()), limit, offset],
        )
    }

    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Zone>> {
        self.query_zones(
            &format!(
                "{ZONE_SELECT_SQL}
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            page_values(page).to_vec(),
        )
    }

    fn update(&self, id: ZoneId, patch: &ZonePatch) -> RepoResult<Option<Zone>> {
        if patch.is_empty() {
            return load_zone(self.conn, id);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "zones", id)? {
            return Ok(None);
        }

        let mut assignments = Assignments::default();
        if let Some(name) = patch.name.as_deref() {
            assignments.set("name", text_value(name));
        }
        if let Some(level) = patch.trust_level {
            assignments.set("trust_level", text_value(trust_level_to_db(level)));
        }
        if let Some(description) = patch.description.as_ref() {
            assignments.set("description", optional_text_value(description.as_deref()));
        }
        assignments.apply(&tx, "zones", id, false)?;

        let zone = load_zone(&tx, id)?;
        tx.commit()?;
        Ok(zone)
    }

    fn delete(&self, id: ZoneId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = delete_row(&tx, "zones", id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn exists(&self, id: ZoneId) -> RepoResult<bool> {
        row_exists(self.conn, "zones", id)
    }

    fn count(&self) -> RepoResult<u64> {
        count_rows(self.conn, "SELECT COUNT(*) FROM zones;", [])
    }

    fn count_by_architecture(&self, architecture_id: ArchitectureId) -> RepoResult<u64> {
        count_in_architecture(self.conn, "zones", architecture_id)
    }
}

fn insert_zone(conn: &Connection, input: &NewZone) -> RepoResult<Zone> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO zones (id, architecture_id, name, trust_level, description)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            id.to_string(),
            input.architecture_id.to_string(),
            input.name.as_str(),
            trust_level_to_db(input.trust_level),
            input.description.as_deref(),
        ],
    )?;
    load_zone(conn, id)?.ok_or_else(|| {
        RepoError::InvalidData(format!("zone {id} missing from read-back after insert"))
    })
}

fn load_zone(conn: &Connection, id: ZoneId) -> RepoResult<Option<Zone>> {
    let mut stmt = conn.prepare(&format!("{ZONE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_zone_row(row)?));
    }
    Ok(None)
}

fn parse_zone_row(row: &Row<'_>) -> RepoResult<Zone> {
    let id_text: String = row.get("id")?;
    let architecture_text: String = row.get("architecture_id")?;
    let level_text: String = row.get("trust_level")?;
    let trust_level = parse_trust_level(&level_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid trust level `{level_text}` in zones.trust_level"
        ))
    })?;

    Ok(Zone {
        id: parse_uuid(&id_text, "zones.id")?,
        architecture_id: parse_uuid(&architecture_text, "zones.architecture_id")?,
        name: row.get("name")?,
        trust_level,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn trust_level_to_db(value: TrustLevel) -> &'static str {
    match value {
        TrustLevel::Untrusted => "untrusted",
        TrustLevel::Low => "low",
        TrustLevel::Medium => "medium",
        TrustLevel::High => "high",
    }
}

fn parse_trust_level(value: &str) -> Option<TrustLevel> {
    match value {
        "untrusted" => Some(TrustLevel::Untrusted),
        "low" => Some(TrustLevel::Low),
        "medium" => Some(TrustLevel::Medium),
        "high" => Some(TrustLevel::High),
        _ => None,
    }
}
