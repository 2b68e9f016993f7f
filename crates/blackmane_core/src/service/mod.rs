//! Core use-case services.
//!
//! # Responsibility
//! - Enforce business rules the schema does not express (non-blank names,
//!   source != target, one architecture per project as a fast path, parent
//!   existence, per-architecture capacity).
//! - Translate repository absence into typed `NotFound` failures.
//! - Compose list pages with the full filtered count.
//!
//! # Invariants
//! - Services are the only layer that produces domain failure kinds.
//! - No operation retries; every failure is returned synchronously.

use crate::model::page::Page;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod architecture_service;
pub mod component_service;
pub mod flow_service;
pub mod project_service;
pub mod zone_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Entity types named by failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Architecture,
    Zone,
    Component,
    Flow,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Architecture => "architecture",
            Self::Zone => "zone",
            Self::Component => "component",
            Self::Flow => "flow",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced id has no row.
    NotFound,
    /// Request collides with current state.
    Conflict,
    /// Shape-valid input that breaks a business rule.
    InvalidArgument,
    /// Store unavailable or rejected the write unexpectedly.
    StorageFailure,
}

/// Errors from service operations.
#[derive(Debug)]
pub enum ServiceError {
    NotFound { entity: EntityKind, id: Uuid },
    Conflict(String),
    InvalidArgument(String),
    Storage(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Rejects blank names and names longer than `max_chars` characters.
///
/// Names are stored as given; only the check trims.
pub(crate) fn validate_name(entity: EntityKind, name: &str, max_chars: usize) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!(
            "{entity} name cannot be empty"
        )));
    }
    if name.chars().count() > max_chars {
        return Err(ServiceError::InvalidArgument(format!(
            "{entity} name cannot exceed {max_chars} characters"
        )));
    }
    Ok(())
}

/// Conflict returned when an architecture already holds `limit` children.
pub(crate) fn capacity_exceeded(
    entity: EntityKind,
    architecture_id: Uuid,
    limit: u32,
) -> ServiceError {
    ServiceError::Conflict(format!(
        "architecture {architecture_id} already holds the maximum of {limit} {entity}s"
    ))
}

/// Builds a page from the filtered `total`; the item query is skipped when
/// the set is empty.
pub(crate) fn collect_page<T>(
    total: u64,
    fetch: impl FnOnce() -> Result<Vec<T>, RepoError>,
) -> ServiceResult<Page<T>> {
    if total == 0 {
        return Ok(Page::empty());
    }
    Ok(Page {
        items: fetch()?,
        total,
    })
}
