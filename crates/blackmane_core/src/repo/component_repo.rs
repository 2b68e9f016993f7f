//! Component repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist components with their security-control flags.
//! - Provide architecture- and zone-scoped pages and counts.
//!
//! # Invariants
//! - The schema rejects a `zone_id` outside the component's architecture.
//! - Deleting a component removes every flow where it is source or target.

use crate::model::architecture::ArchitectureId;
use crate::model::component::{
    Component, ComponentId, ComponentPatch, ComponentType, NewComponent, SecurityControls,
};
use crate::model::page::PageRequest;
use crate::model::zone::ZoneId;
use crate::repo::{
    bool_to_int, bool_value, count_in_architecture, count_rows, delete_row, ensure_table_ready,
    insert_in_transaction, insert_within_limit, optional_text_value, page_values, parse_bool,
    parse_uuid, row_exists, text_value, Assignments, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const COMPONENT_SELECT_SQL: &str = "SELECT
    id,
    architecture_id,
    zone_id,
    name,
    component_type,
    has_admin_interface,
    requires_mfa,
    has_logging,
    encryption_at_rest,
    encryption_in_transit,
    description,
    created_at
FROM components";

const COMPONENT_COLUMNS: &[&str] = &[
    "id",
    "architecture_id",
    "zone_id",
    "name",
    "component_type",
    "has_admin_interface",
    "requires_mfa",
    "has_logging",
    "encryption_at_rest",
    "encryption_in_transit",
    "description",
    "created_at",
];

/// Repository interface for component persistence.
pub trait ComponentRepository {
    fn create(&self, input: &NewComponent) -> RepoResult<Component>;
    /// Inserts unless the architecture already holds `limit` components.
    fn create_within_limit(
        &self,
        input: &NewComponent,
        limit: u32,
    ) -> RepoResult<Option<Component>>;
    fn get_by_id(&self, id: ComponentId) -> RepoResult<Option<Component>>;
    fn get_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> RepoResult<Vec<Component>>;
    fn get_by_zone(&self, zone_id: ZoneId, page: PageRequest) -> RepoResult<Vec<Component>>;
    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Component>>;
    fn update(&self, id: ComponentId, patch: &ComponentPatch) -> RepoResult<Option<Component>>;
    fn delete(&self, id: ComponentId) -> RepoResult<bool>;
    fn exists(&self, id: ComponentId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    fn count_by_architecture(&self, architecture_id: ArchitectureId) -> RepoResult<u64>;
    fn count_by_zone(&self, zone_id: ZoneId) -> RepoResult<u64>;
}

/// SQLite-backed component repository.
pub struct SqliteComponentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteComponentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "components", COMPONENT_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_components(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Component>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut components = Vec::new();
        while let Some(row) = rows.next()? {
            components.push(parse_component_row(row)?);
        }
        Ok(components)
    }
}

impl ComponentRepository for SqliteComponentRepository<'_> {
    fn create(&self, input: &NewComponent) -> RepoResult<Component> {
        insert_in_transaction(self.conn, |conn| insert_component(conn, input))
    }

    fn create_within_limit(
        &self,
        input: &NewComponent,
        limit: u32,
    ) -> RepoResult<Option<Component>> {
        insert_within_limit(self.conn, "components", input.architecture_id, limit, |conn| {
            insert_component(conn, input)
        })
    }

    fn get_by_id(&self, id: ComponentId) -> RepoResult<Option<Component>> {
        load_component(self.conn, id)
    }

    fn get_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> RepoResult<Vec<Component>> {
        let [limit, offset] = page_values(page);
        self.query_components(
            &format!(
                "{COMPONENT_SELECT_SQL}
                 WHERE architecture_id = ?
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            vec![Value::Text(architecture_id.to_string()), limit, offset],
        )
    }

    fn get_by_zone(&self, zone_id: ZoneId, page: PageRequest) -> RepoResult<Vec<Component>> {
        let [limit, offset] = page_values(page);
        self.query_components(
            &format!(
                "{COMPONENT_SELECT_SQL}
                 WHERE zone_id = ?
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            vec![Value::Text(zone_id.to_string()), limit, offset],
        )
    }

    fn get_all(&self, page: PageRequest) -> RepoResult<Vec<Component>> {
        self.query_components(
            &format!(
                "{COMPONENT_SELECT_SQL}
                 ORDER BY rowid ASC
                 LIMIT ? OFFSET ?;"
            ),
            page_values(page).to_vec(),
        )
    }

    fn update(&self, id: ComponentId, patch: &ComponentPatch) -> RepoResult<Option<Component>> {
        if patch.is_empty() {
            return load_component(self.conn, id);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "components", id)? {
            return Ok(None);
        }

        let mut assignments = Assignments::default();
        if let Some(name) = patch.name.as_deref() {
            assignments.set("name", text_value(name));
        }
        if let Some(component_type) = patch.component_type {
            assignments.set(
                "component_type",
                text_value(component_type_to_db(component_type)),
            );
        }
        if let Some(zone_id) = patch.zone_id {
            assignments.set("zone_id", Value::Text(zone_id.to_string()));
        }
        for (column, value) in [
            ("has_admin_interface", patch.has_admin_interface),
            ("requires_mfa", patch.requires_mfa),
            ("has_logging", patch.has_logging),
            ("encryption_at_rest", patch.encryption_at_rest),
            ("encryption_in_transit", patch.encryption_in_transit),
        ] {
            if let Some(value) = value {
                assignments.set(column, bool_value(value));
            }
        }
        if let Some(description) = patch.description.as_ref() {
            assignments.set("description", optional_text_value(description.as_deref()));
        }
        assignments.apply(&tx, "components", id, false)?;

        let component = load_component(&tx, id)?;
        tx.commit()?;
        Ok(component)
    }

    fn delete(&self, id: ComponentId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = delete_row(&tx, "components", id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn exists(&self, id: ComponentId) -> RepoResult<bool> {
        row_exists(self.conn, "components", id)
    }

    fn count(&self) -> RepoResult<u64> {
        count_rows(self.conn, "SELECT COUNT(*) FROM components;", [])
    }

    fn count_by_architecture(&self, architecture_id: ArchitectureId) -> RepoResult<u64> {
        count_in_architecture(self.conn, "components", architecture_id)
    }

    fn count_by_zone(&self, zone_id: ZoneId) -> RepoResult<u64> {
        count_rows(
            self.conn,
            "SELECT COUNT(*) FROM components WHERE zone_id = ?1;",
            [zone_id.to_string()],
        )
    }
}

fn insert_component(conn: &Connection, input: &NewComponent) -> RepoResult<Component> {
    let id = Uuid::new_v4();
    let controls = input.controls;
    conn.execute(
        "INSERT INTO components (
            id,
            architecture_id,
            zone_id,
            name,
            component_type,
            has_admin_interface,
            requires_mfa,
            has_logging,
            encryption_at_rest,
            encryption_in_transit,
            description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            id.to_string(),
            input.architecture_id.to_string(),
            input.zone_id.to_string(),
            input.name.as_str(),
            component_type_to_db(input.component_type),
            bool_to_int(controls.has_admin_interface),
            bool_to_int(controls.requires_mfa),
            bool_to_int(controls.has_logging),
            bool_to_int(controls.encryption_at_rest),
            bool_to_int(controls.encryption_in_transit),
            input.description.as_deref(),
        ],
    )?;
    load_component(conn, id)?.ok_or_else(|| {
        RepoError::InvalidData(format!("component {id} missing from read-back after insert"))
    })
}

fn load_component(conn: &Connection, id: ComponentId) -> RepoResult<Option<Component>> {
    let mut stmt = conn.prepare(&format!("{COMPONENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_component_row(row)?));
    }
    Ok(None)
}

fn parse_component_row(row: &Row<'_>) -> RepoResult<Component> {
    let id_text: String = row.get("id")?;
    let architecture_text: String = row.get("architecture_id")?;
    let zone_text: String = row.get("zone_id")?;
    let type_text: String = row.get("component_type")?;
    let component_type = parse_component_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid component type `{type_text}` in components.component_type"
        ))
    })?;

    let controls = SecurityControls {
        has_admin_interface: parse_bool(
            row.get("has_admin_interface")?,
            "components.has_admin_interface",
        )?,
        requires_mfa: parse_bool(row.get("requires_mfa")?, "components.requires_mfa")?,
        has_logging: parse_bool(row.get("has_logging")?, "components.has_logging")?,
        encryption_at_rest: parse_bool(
            row.get("encryption_at_rest")?,
            "components.encryption_at_rest",
        )?,
        encryption_in_transit: parse_bool(
            row.get("encryption_in_transit")?,
            "components.encryption_in_transit",
        )?,
    };

    Ok(Component {
        id: parse_uuid(&id_text, "components.id")?,
        architecture_id: parse_uuid(&architecture_text, "components.architecture_id")?,
        zone_id: parse_uuid(&zone_text, "components.zone_id")?,
        name: row.get("name")?,
        component_type,
        controls,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn component_type_to_db(value: ComponentType) -> &'static str {
    match value {
        ComponentType::Firewall => "firewall",
        ComponentType::LoadBalancer => "load_balancer",
        ComponentType::Server => "server",
        ComponentType::Database => "database",
        ComponentType::Iam => "iam",
        ComponentType::Bastion => "bastion",
        ComponentType::ApiGateway => "api_gateway",
        ComponentType::Vpn => "vpn",
        ComponentType::Other => "other",
    }
}

fn parse_component_type(value: &str) -> Option<ComponentType> {
    match value {
        "firewall" => Some(ComponentType::Firewall),
        "load_balancer" => Some(ComponentType::LoadBalancer),
        "server" => Some(ComponentType::Server),
        "database" => Some(ComponentType::Database),
        "iam" => Some(ComponentType::Iam),
        "bastion" => Some(ComponentType::Bastion),
        "api_gateway" => Some(ComponentType::ApiGateway),
        "vpn" => Some(ComponentType::Vpn),
        "other" => Some(ComponentType::Other),
        _ => None,
    }
}
