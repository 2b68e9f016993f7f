//! Architecture use-case service.
//!
//! # Responsibility
//! - Create the single architecture of a project.
//! - Read, update and delete architectures by id or owning project.
//!
//! # Invariants
//! - The read-side duplicate check only produces a friendlier message. The
//!   UNIQUE index on `architectures.project_id` is the authority, and its
//!   violation is reported as the same `Conflict`.

use crate::model::architecture::{
    Architecture, ArchitectureId, ArchitecturePatch, NewArchitecture,
};
use crate::model::page::{Page, PageRequest};
use crate::model::project::ProjectId;
use crate::repo::architecture_repo::ArchitectureRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::service::{collect_page, EntityKind, ServiceError, ServiceResult};
use log::{info, warn};

/// Architecture service facade.
pub struct ArchitectureService<A: ArchitectureRepository, P: ProjectRepository> {
    architectures: A,
    projects: P,
}

impl<A: ArchitectureRepository, P: ProjectRepository> ArchitectureService<A, P> {
    pub fn new(architectures: A, projects: P) -> Self {
        Self {
            architectures,
            projects,
        }
    }

    /// Creates the architecture of `input.project_id`.
    ///
    /// # Errors
    /// - `NotFound` when the project does not exist.
    /// - `Conflict` when the project already has an architecture, including
    ///   when a concurrent request won the insert.
    pub fn create_architecture(&self, input: &NewArchitecture) -> ServiceResult<Architecture> {
        let project_id = input.project_id;
        if !self.projects.exists(project_id)? {
            return Err(ServiceError::not_found(EntityKind::Project, project_id));
        }
        if self.architectures.get_by_project(project_id)?.is_some() {
            warn!(
                "event=architecture_create module=service status=rejected reason=duplicate project_id={project_id}"
            );
            return Err(duplicate_architecture(project_id));
        }

        match self.architectures.create(input) {
            Ok(architecture) => {
                info!(
                    "event=architecture_create module=service status=ok architecture_id={} project_id={project_id}",
                    architecture.id
                );
                Ok(architecture)
            }
            Err(err) if err.is_unique_violation() => {
                warn!(
                    "event=architecture_create module=service status=rejected reason=duplicate_race project_id={project_id}"
                );
                Err(duplicate_architecture(project_id))
            }
            Err(err) if err.is_foreign_key_violation() => {
                // Project removed between the existence check and the insert.
                Err(ServiceError::not_found(EntityKind::Project, project_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_architecture(&self, id: ArchitectureId) -> ServiceResult<Architecture> {
        self.architectures
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Architecture, id))
    }

    /// Returns the project's architecture, or `None` when it has none yet.
    pub fn get_architecture_by_project(
        &self,
        project_id: ProjectId,
    ) -> ServiceResult<Option<Architecture>> {
        Ok(self.architectures.get_by_project(project_id)?)
    }

    pub fn list_architectures(&self, page: PageRequest) -> ServiceResult<Page<Architecture>> {
        let total = self.architectures.count()?;
        collect_page(total, || self.architectures.get_all(page))
    }

    pub fn update_architecture(
        &self,
        id: ArchitectureId,
        patch: &ArchitecturePatch,
    ) -> ServiceResult<Architecture> {
        let architecture = self
            .architectures
            .update(id, patch)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Architecture, id))?;
        info!(
            "event=architecture_update module=service status=ok architecture_id={id} changed={}",
            !patch.is_empty()
        );
        Ok(architecture)
    }

    /// Deletes an architecture with all zones, components and flows.
    pub fn delete_architecture(&self, id: ArchitectureId) -> ServiceResult<()> {
        if !self.architectures.delete(id)? {
            return Err(ServiceError::not_found(EntityKind::Architecture, id));
        }
        info!("event=architecture_delete module=service status=ok architecture_id={id}");
        Ok(())
    }
}

fn duplicate_architecture(project_id: ProjectId) -> ServiceError {
    ServiceError::Conflict(format!(
        "architecture already exists for project {project_id}"
    ))
}
