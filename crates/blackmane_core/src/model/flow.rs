//! Data flow domain model.
//!
//! # Invariants
//! - A flow is a directed edge between two distinct components of its own
//!   architecture.
//! - `port`, when set, lies in `1..=65535`.
//! - Flows own nothing; deleting one affects no other row.

use crate::model::architecture::ArchitectureId;
use crate::model::component::ComponentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type FlowId = Uuid;

/// Application protocol carried by a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowProtocol {
    Http,
    Https,
    Ssh,
    Rdp,
    Sql,
    Ldap,
    Dns,
    Smtp,
    Other,
}

/// Stored flow view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub architecture_id: ArchitectureId,
    pub source_component_id: ComponentId,
    pub target_component_id: ComponentId,
    pub protocol: FlowProtocol,
    pub port: Option<u16>,
    pub is_authenticated: bool,
    pub is_encrypted: bool,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Input for flow creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlow {
    pub architecture_id: ArchitectureId,
    pub source_component_id: ComponentId,
    pub target_component_id: ComponentId,
    pub protocol: FlowProtocol,
    pub port: Option<u16>,
    pub is_authenticated: bool,
    pub is_encrypted: bool,
    pub description: Option<String>,
}

impl NewFlow {
    pub fn new(
        architecture_id: ArchitectureId,
        source_component_id: ComponentId,
        target_component_id: ComponentId,
        protocol: FlowProtocol,
    ) -> Self {
        Self {
            architecture_id,
            source_component_id,
            target_component_id,
            protocol,
            port: None,
            is_authenticated: false,
            is_encrypted: false,
            description: None,
        }
    }
}

/// Partial flow update.
///
/// `port: Some(None)` and `description: Some(None)` clear stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowPatch {
    pub source_component_id: Option<ComponentId>,
    pub target_component_id: Option<ComponentId>,
    pub protocol: Option<FlowProtocol>,
    pub port: Option<Option<u16>>,
    pub is_authenticated: Option<bool>,
    pub is_encrypted: Option<bool>,
    pub description: Option<Option<String>>,
}

impl FlowPatch {
    pub fn is_empty(&self) -> bool {
        self.source_component_id.is_none()
            && self.target_component_id.is_none()
            && self.protocol.is_none()
            && self.port.is_none()
            && self.is_authenticated.is_none()
            && self.is_encrypted.is_none()
            && self.description.is_none()
    }

    /// Returns whether the patch re-points either endpoint.
    pub fn moves_endpoints(&self) -> bool {
        self.source_component_id.is_some() || self.target_component_id.is_some()
    }
}
