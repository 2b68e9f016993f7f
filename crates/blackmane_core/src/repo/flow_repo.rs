//! Flow repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist directed flows between components.
//! - Answer "every flow touching this component" as one OR predicate over
//!   both endpoint columns, so pagination and counting see each flow once.
//!
//! # Invariants
//! - Both endpoints live in the flow's architecture (compound keys).
//! - `source_component_id <> target_component_id` is a table CHECK.

use crate::model::architecture::ArchitectureId;
use crate::model::component::ComponentId;
use crate::model::flow::{Flow, FlowId, FlowPatch, FlowProtocol, NewFlow};
use crate::model::page::PageRequest;
use crate::repo::{
    bool_to_int, bool_value, count_in_architecture, count_rows, delete_row, ensure_table_ready,
    insert_in_transaction, insert_within_limit, optional_text_value, page_values, parse_bool,
    parse_uuid, row_exists, text_value, Assignments, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const FLOW_SELECT_SQL: &str = "SELECT
    id,
    architecture_id,
    source_component_id,
    target_component_id,
    protocol,
    port,
    is_authenticated,
    is_encrypted,
    description,
    created_at
FROM flows";

const FLOW_COLUMNS: &[&str] = &[
    "id",
    "architecture_id",
    "source_component_id",
    "target_component_id",
    "protocol",
    "port",
    "is_authenticated",
    "is_encrypted",
    "description",
    "created_at",
];

/// Repository interface for flow persistence.
pub trait FlowRepository {
    fn create(&self, input: &NewFlow) -> RepoResult<Flow>;
    /// Inserts unless the architecture already holds `limit` flows.
    fn create_within_limit(&self, input: &NewFlow, limit: u32) -> RepoResult<Option<Flow>>;
    fn get_by_id(&self, id: FlowId) -> RepoResult<Option<Flow>>;
    fn get_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> RepoResult<Vec<Flow>>;
    /// Lists flows where the component is source or target.
    fn get_by_component(
        &self,
        component_id: ComponentId,
        page: PageRequest,
    ) -> RepoResult<Vec<Flow>>;
    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Flow>>;
    fn update(&self, id: FlowId, patch: &FlowPatch) -> RepoResult<Option<Flow>>;
    fn delete(&self, id: FlowId) -> RepoResult<bool>;
    fn exists(&self, id: FlowId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    fn count_by_architecture(&self, architecture_id: ArchitectureId) -> RepoResult<u64>;
    fn count_by_component(&self, component_id: ComponentId) -> RepoResult<u64>;
}

/// SQLite-backed flow repository.
pub struct SqliteFlowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFlowRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "flows", FLOW_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_flows(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Flow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut flows = Vec::new();
        while let Some(row) = rows.next()? {
            flows.push(parse_flow_row(row)?);
        }
        Ok(flows)
    }
}

impl FlowRepository for SqliteFlowRepository<'_> {
    fn create(&self, input: &NewFlow) -> RepoResult<Flow> {
        insert_in_transaction(self.conn, |conn| insert_flow(conn, input))
    }

    fn create_within_limit(&self, input: &NewFlow, limit: u32) -> RepoResult<Option<Flow>> {
        insert_within_limit(self.conn, "flows", input.architecture_id, limit, |conn| {
            insert_flow(conn, input)
        })
    }

    fn get_by_id(&self, id: FlowId) -> RepoResult<Option<Flow>> {
        load_flow(self.conn, id)
    }

    fn get_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> RepoResult<Vec<Flow>> {
        let [limit, offset] = page_values(page);
        self.query_flows(
            &format!(
                "{FLOW_SELECT_SQL}
                 WHERE architecture_id = ?
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            vec![Value::Text(architecture_id.to_string()), limit, offset],
        )
    }

    fn get_by_component(
        &self,
        component_id: ComponentId,
        page: PageRequest,
    ) -> RepoResult<Vec<Flow>> {
        let [limit, offset] = page_values(page);
        self.query_flows(
            &format!(
                "{FLOW_SELECT_SQL}
                 WHERE source_component_id = ?1
                    OR target_component_id = ?1
                 ORDER BY rowid ASC
                 LIMIT ?2 OFFSET ?3;"
            ),
            vec![Value::Text(component_id.to_string()), limit, offset],
        )
    }

    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Flow>> {
        self.query_flows(
            &format!(
                "{FLOW_SELECT_SQL}
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            page_values(page).to_vec(),
        )
    }

    fn update(&self, id: FlowId, patch: &FlowPatch) -> RepoResult<Option<Flow>> {
        if patch.is_empty() {
            return load_flow(self.conn, id);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "flows", id)? {
            return Ok(None);
        }

        let mut assignments = Assignments::default();
        if let Some(source) = patch.source_component_id {
            assignments.set("source_component_id", Value::Text(source.to_string()));
        }
        if let Some(target) = patch.target_component_id {
            assignments.set("target_component_id", Value::Text(target.to_string()));
        }
        if let Some(protocol) = patch.protocol {
            assignments.set("protocol", text_value(protocol_to_db(protocol)));
        }
        if let Some(port) = patch.port {
            assignments.set(
                "port",
                port.map_or(Value::Null, |port| Value::Integer(i64::from(port))),
            );
        }
        if let Some(value) = patch.is_authenticated {
            assignments.set("is_authenticated", bool_value(value));
        }
        if let Some(value) = patch.is_encrypted {
            assignments.set("is_encrypted", bool_value(value));
        }
        if let Some(description) = patch.description.as_ref() {
            assignments.set("description", optional_text_value(description.as_deref()));
        }
        assignments.apply(&tx, "flows", id, false)?;

        let flow = load_flow(&tx, id)?;
        tx.commit()?;
        Ok(flow)
    }

    fn delete(&self, id: FlowId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = delete_row(&tx, "flows", id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn exists(&self, id: FlowId) -> RepoResult<bool> {
        row_exists(self.conn, "flows", id)
    }

    fn count(&self) -> RepoResult<u64> {
        count_rows(self.conn, "SELECT COUNT(*) FROM flows;", [])
    }

    fn count_by_architecture(&self, architecture_id: ArchitectureId) -> RepoResult<u64> {
        count_in_architecture(self.conn, "flows", architecture_id)
    }

    fn count_by_component(&self, component_id: ComponentId) -> RepoResult<u64> {
        count_rows(
            self.conn,
            "SELECT COUNT(*)
             FROM flows
             WHERE source_component_id = ?1
                OR target_component_id = ?1;",
            [component_id.to_string()],
        )
    }
}

fn insert_flow(conn: &Connection, input: &NewFlow) -> RepoResult<Flow> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO flows (
            id,
            architecture_id,
            source_component_id,
            target_component_id,
            protocol,
            port,
            is_authenticated,
            is_encrypted,
            description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            id.to_string(),
            input.architecture_id.to_string(),
            input.source_component_id.to_string(),
            input.target_component_id.to_string(),
            protocol_to_db(input.protocol),
            input.port,
            bool_to_int(input.is_authenticated),
            bool_to_int(input.is_encrypted),
            input.description.as_deref(),
        ],
    )?;
    load_flow(conn, id)?.ok_or_else(|| {
        RepoError::InvalidData(format!("flow {id} missing from read-back after insert"))
    })
}

fn load_flow(conn: &Connection, id: FlowId) -> RepoResult<Option<Flow>> {
    let mut stmt = conn.prepare(&format!("{FLOW_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_flow_row(row)?));
    }
    Ok(None)
}

fn parse_flow_row(row: &Row<'_>) -> RepoResult<Flow> {
    let id_text: String = row.get("id")?;
    let architecture_text: String = row.get("architecture_id")?;
    let source_text: String = row.get("source_component_id")?;
    let target_text: String = row.get("target_component_id")?;
    let protocol_text: String = row.get("protocol")?;
    let protocol = parse_protocol(&protocol_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid protocol `{protocol_text}` in flows.protocol"
        ))
    })?;
    let port = match row.get::<_, Option<i64>>("port")? {
        Some(value) => Some(u16::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid port `{value}` in flows.port"))
        })?),
        None => None,
    };

    Ok(Flow {
        id: parse_uuid(&id_text, "flows.id")?,
        architecture_id: parse_uuid(&architecture_text, "flows.architecture_id")?,
        source_component_id: parse_uuid(&source_text, "flows.source_component_id")?,
        target_component_id: parse_uuid(&target_text, "flows.target_component_id")?,
        protocol,
        port,
        is_authenticated: parse_bool(row.get("is_authenticated")?, "flows.is_authenticated")?,
        is_encrypted: parse_bool(row.get("is_encrypted")?, "flows.is_encrypted")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn protocol_to_db(value: FlowProtocol) -> &'static str {
    match value {
        FlowProtocol::Http => "http",
        FlowProtocol::Https => "https",
        FlowProtocol::Ssh => "ssh",
        FlowProtocol::Rdp => "rdp",
        FlowProtocol::Sql => "sql",
        FlowProtocol::Ldap => "ldap",
        FlowProtocol::Dns => "dns",
        FlowProtocol::Smtp => "smtp",
        FlowProtocol::Other => "other",
    }
}

fn parse_protocol(value: &str) -> Option<FlowProtocol> {
    match value {
        "http" => Some(FlowProtocol::Http),
        "https" => Some(FlowProtocol::Https),
        "ssh" => Some(FlowProtocol::Ssh),
        "rdp" => Some(FlowProtocol::Rdp),
        "sql" => Some(FlowProtocol::Sql),
        "ldap" => Some(FlowProtocol::Ldap),
        "dns" => Some(FlowProtocol::Dns),
        "smtp" => Some(FlowProtocol::Smtp),
        "other" => Some(FlowProtocol::Other),
        _ => None,
    }
}
