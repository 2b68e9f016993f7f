//! Component domain model.
//!
//! # Invariants
//! - `zone_id` references a zone of the same architecture. The store
//!   enforces this with a compound key on `(architecture_id, zone_id)`.
//! - Security posture flags default to `false`.

use crate::model::architecture::ArchitectureId;
use crate::model::zone::ZoneId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ComponentId = Uuid;

/// Upper bound on component name length, counted in characters.
pub const COMPONENT_NAME_MAX_CHARS: usize = 100;

/// Infrastructure role of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Firewall,
    LoadBalancer,
    Server,
    Database,
    Iam,
    Bastion,
    ApiGateway,
    Vpn,
    Other,
}

/// Security-relevant properties of a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityControls {
    pub has_admin_interface: bool,
    pub requires_mfa: bool,
    pub has_logging: bool,
    pub encryption_at_rest: bool,
    pub encryption_in_transit: bool,
}

/// Stored component view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub architecture_id: ArchitectureId,
    pub zone_id: ZoneId,
    pub name: String,
    pub component_type: ComponentType,
    #[serde(flatten)]
    pub controls: SecurityControls,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Input for component creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComponent {
    pub architecture_id: ArchitectureId,
    pub zone_id: ZoneId,
    pub name: String,
    pub component_type: ComponentType,
    pub controls: SecurityControls,
    pub description: Option<String>,
}

impl NewComponent {
    pub fn new(
        architecture_id: ArchitectureId,
        zone_id: ZoneId,
        name: impl Into<String>,
        component_type: ComponentType,
    ) -> Self {
        Self {
            architecture_id,
            zone_id,
            name: name.into(),
            component_type,
            controls: SecurityControls::default(),
            description: None,
        }
    }
}

/// Partial component update. Moving to another zone is allowed only within
/// the component's architecture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentPatch {
    pub name: Option<String>,
    pub component_type: Option<ComponentType>,
    pub zone_id: Option<ZoneId>,
    pub has_admin_interface: Option<bool>,
    pub requires_mfa: Option<bool>,
    pub has_logging: Option<bool>,
    pub encryption_at_rest: Option<bool>,
    pub encryption_in_transit: Option<bool>,
    pub description: Option<Option<String>>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.component_type.is_none()
            && self.zone_id.is_none()
            && self.has_admin_interface.is_none()
            && self.requires_mfa.is_none()
            && self.has_logging.is_none()
            && self.encryption_at_rest.is_none()
            && self.encryption_in_transit.is_none()
            && self.description.is_none()
    }
}
