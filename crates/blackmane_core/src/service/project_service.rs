//! Project use-case service.
//!
//! # Invariants
//! - Project names are non-blank and at most `PROJECT_NAME_MAX_CHARS`
//!   characters, re-checked here for callers that skip shape validation.
//! - Deleting a project cascades through its whole architecture graph.

use crate::model::page::{Page, PageRequest};
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch, PROJECT_NAME_MAX_CHARS};
use crate::repo::project_repo::ProjectRepository;
use crate::service::{collect_page, validate_name, EntityKind, ServiceError, ServiceResult};
use log::{info, warn};

/// Project service facade over repository implementations.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_project(&self, input: &NewProject) -> ServiceResult<Project> {
        if let Err(err) = validate_name(EntityKind::Project, &input.name, PROJECT_NAME_MAX_CHARS) {
            warn!("event=project_create module=service status=rejected reason=invalid_name");
            return Err(err);
        }

        let project = self.repo.create(input)?;
        info!(
            "event=project_create module=service status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> ServiceResult<Project> {
        self.repo
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Project, id))
    }

    /// Lists projects with the total number of stored projects.
    pub fn list_projects(&self, page: PageRequest) -> ServiceResult<Page<Project>> {
        let total = self.repo.count()?;
        collect_page(total, || self.repo.get_all(page))
    }

    /// Applies only the fields present in `patch`.
    pub fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> ServiceResult<Project> {
        if let Some(name) = patch.name.as_deref() {
            if let Err(err) = validate_name(EntityKind::Project, name, PROJECT_NAME_MAX_CHARS) {
                warn!(
                    "event=project_update module=service status=rejected reason=invalid_name project_id={id}"
                );
                return Err(err);
            }
        }

        let project = self
            .repo
            .update(id, patch)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Project, id))?;
        info!(
            "event=project_update module=service status=ok project_id={id} changed={}",
            !patch.is_empty()
        );
        Ok(project)
    }

    /// Deletes a project together with its architecture and analyses.
    pub fn delete_project(&self, id: ProjectId) -> ServiceResult<()> {
        if !self.repo.delete(id)? {
            return Err(ServiceError::not_found(EntityKind::Project, id));
        }
        info!("event=project_delete module=service status=ok project_id={id}");
        Ok(())
    }
}
