//! Trust zone use-case service.

use crate::config::ModelLimits;
use crate::model::architecture::ArchitectureId;
use crate::model::page::{Page, PageRequest};
use crate::model::zone::{NewZone, Zone, ZoneId, ZonePatch, ZONE_NAME_MAX_CHARS};
use crate::repo::architecture_repo::ArchitectureRepository;
use crate::repo::zone_repo::ZoneRepository;
use crate::service::{
    capacity_exceeded, collect_page, validate_name, EntityKind, ServiceError, ServiceResult,
};
use log::{info, warn};

/// Zone service facade.
pub struct ZoneService<Z: ZoneRepository, A: ArchitectureRepository> {
    zones: Z,
    architectures: A,
    limits: ModelLimits,
}

impl<Z: ZoneRepository, A: ArchitectureRepository> ZoneService<Z, A> {
    pub fn new(zones: Z, architectures: A) -> Self {
        Self {
            zones,
            architectures,
            limits: ModelLimits::default(),
        }
    }

    /// Replaces the default per-architecture capacity limits.
    pub fn with_limits(mut self, limits: ModelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn create_zone(&self, input: &NewZone) -> ServiceResult<Zone> {
        if let Err(err) = validate_name(EntityKind::Zone, &input.name, ZONE_NAME_MAX_CHARS) {
            warn!("event=zone_create module=service status=rejected reason=invalid_name");
            return Err(err);
        }
        let architecture_id = input.architecture_id;
        if !self.architectures.exists(architecture_id)? {
            return Err(ServiceError::not_found(
                EntityKind::Architecture,
                architecture_id,
            ));
        }
        let limit = self.limits.max_zones;
        let Some(zone) = self.zones.create_within_limit(input, limit)? else {
            warn!(
                "event=zone_create module=service status=rejected reason=capacity architecture_id={architecture_id} limit={limit}"
            );
            return Err(capacity_exceeded(EntityKind::Zone, architecture_id, limit));
        };
        info!(
            "event=zone_create module=service status=ok zone_id={} architecture_id={architecture_id}",
            zone.id
        );
        Ok(zone)
    }

    pub fn get_zone(&self, id: ZoneId) -> ServiceResult<Zone> {
        self.zones
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Zone, id))
    }

    /// Lists one page of an architecture's zones with the architecture total.
    pub fn get_zones_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> ServiceResult<Page<Zone>> {
        let total = self.zones.count_by_architecture(architecture_id)?;
        collect_page(total, || self.zones.get_by_architecture(architecture_id, page))
    }

    pub fn list_zones(&self, page: PageRequest) -> ServiceResult<Page<Zone>> {
        let total = self.zones.count()?;
        collect_page(total, || self.zones.get_all(page))
    }

    pub fn update_zone(&self, id: ZoneId, patch: &ZonePatch) -> ServiceResult<Zone> {
        if let Some(name) = patch.name.as_deref() {
            if let Err(err) = validate_name(EntityKind::Zone, name, ZONE_NAME_MAX_CHARS) {
                warn!(
                    "event=zone_update module=service status=rejected reason=invalid_name zone_id={id}"
                );
                return Err(err);
            }
        }

        let zone = self
            .zones
            .update(id, patch)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Zone, id))?;
        info!(
            "event=zone_update module=service status=ok zone_id={id} changed={}",
            !patch.is_empty()
        );
        Ok(zone)
    }

    /// Deletes a zone with its components and their flows.
    pub fn delete_zone(&self, id: ZoneId) -> ServiceResult<()> {
        if !self.zones.delete(id)? {
            return Err(ServiceError::not_found(EntityKind::Zone, id));
        }
        info!("event=zone_delete module=service status=ok zone_id={id}");
        Ok(())
    }
}
