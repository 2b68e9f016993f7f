//! Component use-case service.
//!
//! # Invariants
//! - A component sits in a zone of its own architecture, on create and on
//!   every zone move.

use crate::config::ModelLimits;
use crate::model::architecture::ArchitectureId;
use crate::model::component::{
    Component, ComponentId, ComponentPatch, NewComponent, COMPONENT_NAME_MAX_CHARS,
};
use crate::model::page::{Page, PageRequest};
use crate::model::zone::ZoneId;
use crate::repo::component_repo::ComponentRepository;
use crate::repo::zone_repo::ZoneRepository;
use crate::service::{
    capacity_exceeded, collect_page, validate_name, EntityKind, ServiceError, ServiceResult,
};
use log::{info, warn};

/// Component service facade.
pub struct ComponentService<C: ComponentRepository, Z: ZoneRepository> {
    components: C,
    zones: Z,
    limits: ModelLimits,
}

impl<C: ComponentRepository, Z: ZoneRepository> ComponentService<C, Z> {
    pub fn new(components: C, zones: Z) -> Self {
        Self {
            components,
            zones,
            limits: ModelLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ModelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Creates a component inside `input.zone_id`.
    ///
    /// # Errors
    /// - `InvalidArgument` for a blank or over-long name, or a zone that
    ///   belongs to another architecture.
    /// - `NotFound` when the zone does not exist.
    /// - `Conflict` when the architecture is at its component limit.
    pub fn create_component(&self, input: &NewComponent) -> ServiceResult<Component> {
        if let Err(err) =
            validate_name(EntityKind::Component, &input.name, COMPONENT_NAME_MAX_CHARS)
        {
            warn!("event=component_create module=service status=rejected reason=invalid_name");
            return Err(err);
        }
        self.ensure_zone_in_architecture(input.zone_id, input.architecture_id, "component_create")?;
        let limit = self.limits.max_components;
        let Some(component) = self.components.create_within_limit(input, limit)? else {
            warn!(
                "event=component_create module=service status=rejected reason=capacity architecture_id={} limit={limit}",
                input.architecture_id
            );
            return Err(capacity_exceeded(
                EntityKind::Component,
                input.architecture_id,
                limit,
            ));
        };
        info!(
            "event=component_create module=service status=ok component_id={} zone_id={} architecture_id={}",
            component.id, component.zone_id, component.architecture_id
        );
        Ok(component)
    }

    pub fn get_component(&self, id: ComponentId) -> ServiceResult<Component> {
        self.components
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Component, id))
    }

    pub fn get_components_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> ServiceResult<Page<Component>> {
        let total = self.components.count_by_architecture(architecture_id)?;
        collect_page(total, || self.components.get_by_architecture(architecture_id, page))
    }

    pub fn get_components_by_zone(
        &self,
        zone_id: ZoneId,
        page: PageRequest,
    ) -> ServiceResult<Page<Component>> {
        let total = self.components.count_by_zone(zone_id)?;
        collect_page(total, || self.components.get_by_zone(zone_id, page))
    }

    pub fn list_components(&self, page: PageRequest) -> ServiceResult<Page<Component>> {
        let total = self.components.count()?;
        collect_page(total, || self.components.get_all(page))
    }

    /// Applies `patch`; a `zone_id` change must stay inside the architecture.
    pub fn update_component(
        &self,
        id: ComponentId,
        patch: &ComponentPatch,
    ) -> ServiceResult<Component> {
        if let Some(name) = patch.name.as_deref() {
            if let Err(err) = validate_name(EntityKind::Component, name, COMPONENT_NAME_MAX_CHARS)
            {
                warn!(
                    "event=component_update module=service status=rejected reason=invalid_name component_id={id}"
                );
                return Err(err);
            }
        }
        if let Some(zone_id) = patch.zone_id {
            let current = self.get_component(id)?;
            if zone_id != current.zone_id {
                self.ensure_zone_in_architecture(
                    zone_id,
                    current.architecture_id,
                    "component_update",
                )?;
            }
        }

        let component = self
            .components
            .update(id, patch)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Component, id))?;
        info!(
            "event=component_update module=service status=ok component_id={id} changed={}",
            !patch.is_empty()
        );
        Ok(component)
    }

    /// Deletes a component and every flow touching it.
    pub fn delete_component(&self, id: ComponentId) -> ServiceResult<()> {
        if !self.components.delete(id)? {
            return Err(ServiceError::not_found(EntityKind::Component, id));
        }
        info!("event=component_delete module=service status=ok component_id={id}");
        Ok(())
    }

    fn ensure_zone_in_architecture(
        &self,
        zone_id: ZoneId,
        architecture_id: ArchitectureId,
        event: &str,
    ) -> ServiceResult<()> {
        let zone = self
            .zones
            .get_by_id(zone_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Zone, zone_id))?;
        if zone.architecture_id != architecture_id {
            warn!(
                "event={event} module=service status=rejected reason=zone_outside_architecture zone_id={zone_id}"
            );
            return Err(ServiceError::InvalidArgument(format!(
                "zone {zone_id} does not belong to architecture {architecture_id}"
            )));
        }
        Ok(())
    }
}
