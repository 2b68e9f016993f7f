//! Trust zone domain model.

use crate::model::architecture::ArchitectureId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ZoneId = Uuid;

/// Upper bound on zone name length, counted in characters.
pub const ZONE_NAME_MAX_CHARS: usize = 100;

/// How far traffic originating in a zone can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Untrusted,
    Low,
    Medium,
    High,
}

/// Stored zone view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub architecture_id: ArchitectureId,
    pub name: String,
    pub trust_level: TrustLevel,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Input for zone creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewZone {
    pub architecture_id: ArchitectureId,
    pub name: String,
    pub trust_level: TrustLevel,
    pub description: Option<String>,
}

impl NewZone {
    pub fn new(
        architecture_id: ArchitectureId,
        name: impl Into<String>,
        trust_level: TrustLevel,
    ) -> Self {
        Self {
            architecture_id,
            name: name.into(),
            trust_level,
            description: None,
        }
    }
}

/// Partial zone update. The owning architecture cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZonePatch {
    pub name: Option<String>,
    pub trust_level: Option<TrustLevel>,
    pub description: Option<Option<String>>,
}

impl ZonePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.trust_level.is_none() && self.description.is_none()
    }
}
