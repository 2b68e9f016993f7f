//! Project domain model.
//!
//! # Responsibility
//! - Define the root entity of the graph and its create/patch inputs.
//!
//! # Invariants
//! - `name` is non-blank and at most `PROJECT_NAME_MAX_CHARS` characters.
//! - `project_type` is fixed after creation.
//! - `created_at`/`updated_at` are assigned by the store (epoch ms).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

/// Upper bound on project name length, counted in characters.
pub const PROJECT_NAME_MAX_CHARS: usize = 200;

/// Kind of infrastructure the project describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "cloud")]
    Cloud,
    #[serde(rename = "on-premise")]
    OnPremise,
    #[serde(rename = "hybrid")]
    Hybrid,
}

/// Business criticality of the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Stored project view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub project_type: ProjectType,
    pub business_context: Option<String>,
    pub criticality_level: CriticalityLevel,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, refreshed on every non-empty update.
    pub updated_at: i64,
}

/// Input for project creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub project_type: ProjectType,
    pub business_context: Option<String>,
    pub criticality_level: CriticalityLevel,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        project_type: ProjectType,
        criticality_level: CriticalityLevel,
    ) -> Self {
        Self {
            name: name.into(),
            project_type,
            business_context: None,
            criticality_level,
        }
    }
}

/// Partial project update. `None` leaves a field untouched.
///
/// `business_context: Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub business_context: Option<Option<String>>,
    pub criticality_level: Option<CriticalityLevel>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.business_context.is_none() && self.criticality_level.is_none()
    }
}
