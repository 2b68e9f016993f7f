//! Architecture domain model.
//!
//! # Invariants
//! - At most one architecture exists per project (unique `project_id`).
//! - Zones, components and flows are owned by exactly one architecture.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ArchitectureId = Uuid;

/// Stored architecture view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub id: ArchitectureId,
    pub project_id: ProjectId,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for architecture creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArchitecture {
    pub project_id: ProjectId,
    pub description: Option<String>,
}

impl NewArchitecture {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            description: None,
        }
    }
}

/// Partial architecture update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchitecturePatch {
    pub description: Option<Option<String>>,
}

impl ArchitecturePatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
    }
}
