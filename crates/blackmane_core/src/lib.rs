//! Core entity graph for BLACKMANE security architectures.
//!
//! Projects own one architecture; architectures own trust zones, components
//! and the data flows between components. Storage enforces ownership and
//! cascade rules, services enforce the remaining business rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, ModelLimits};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
};
pub use model::architecture::{Architecture, ArchitectureId, ArchitecturePatch, NewArchitecture};
pub use model::component::{
    Component, ComponentId, ComponentPatch, ComponentType, NewComponent, SecurityControls,
};
pub use model::flow::{Flow, FlowId, FlowPatch, FlowProtocol, NewFlow};
pub use model::page::{Page, PageRequest};
pub use model::project::{
    CriticalityLevel, NewProject, Project, ProjectId, ProjectPatch, ProjectType,
};
pub use model::zone::{NewZone, TrustLevel, Zone, ZoneId, ZonePatch};
pub use repo::architecture_repo::{ArchitectureRepository, SqliteArchitectureRepository};
pub use repo::component_repo::{ComponentRepository, SqliteComponentRepository};
pub use repo::flow_repo::{FlowRepository, SqliteFlowRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::zone_repo::{SqliteZoneRepository, ZoneRepository};
pub use repo::{RepoError, RepoResult};
pub use service::architecture_service::ArchitectureService;
pub use service::component_service::ComponentService;
pub use service::flow_service::FlowService;
pub use service::project_service::ProjectService;
pub use service::zone_service::ZoneService;
pub use service::{EntityKind, ErrorKind, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
