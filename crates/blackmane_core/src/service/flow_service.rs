//! Flow use-case service.
//!
//! # Responsibility
//! - Validate directed edges before they reach storage: distinct endpoints,
//!   port range, endpoints inside the flow's architecture.
//! - Re-validate the merged endpoints when an update re-points a flow.

use crate::config::ModelLimits;
use crate::model::architecture::ArchitectureId;
use crate::model::component::ComponentId;
use crate::model::flow::{Flow, FlowId, FlowPatch, NewFlow};
use crate::model::page::{Page, PageRequest};
use crate::repo::component_repo::ComponentRepository;
use crate::repo::flow_repo::FlowRepository;
use crate::service::{capacity_exceeded, collect_page, EntityKind, ServiceError, ServiceResult};
use log::{info, warn};

/// Flow service facade.
pub struct FlowService<F: FlowRepository, C: ComponentRepository> {
    flows: F,
    components: C,
    limits: ModelLimits,
}

impl<F: FlowRepository, C: ComponentRepository> FlowService<F, C> {
    pub fn new(flows: F, components: C) -> Self {
        Self {
            flows,
            components,
            limits: ModelLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ModelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Creates a flow between two components.
    ///
    /// Endpoint equality is checked before any lookup, so a self-loop is
    /// `InvalidArgument` even when the component does not exist.
    pub fn create_flow(&self, input: &NewFlow) -> ServiceResult<Flow> {
        ensure_distinct_endpoints(
            input.source_component_id,
            input.target_component_id,
            "flow_create",
        )?;
        ensure_valid_port(input.port, "flow_create")?;
        self.ensure_endpoints_in_architecture(
            input.architecture_id,
            input.source_component_id,
            input.target_component_id,
            "flow_create",
        )?;
        let limit = self.limits.max_flows;
        let Some(flow) = self.flows.create_within_limit(input, limit)? else {
            warn!(
                "event=flow_create module=service status=rejected reason=capacity architecture_id={} limit={limit}",
                input.architecture_id
            );
            return Err(capacity_exceeded(EntityKind::Flow, input.architecture_id, limit));
        };
        info!(
            "event=flow_create module=service status=ok flow_id={} source_id={} target_id={}",
            flow.id, flow.source_component_id, flow.target_component_id
        );
        Ok(flow)
    }

    pub fn get_flow(&self, id: FlowId) -> ServiceResult<Flow> {
        self.flows
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Flow, id))
    }

    pub fn get_flows_by_architecture(
        &self,
        architecture_id: ArchitectureId,
        page: PageRequest,
    ) -> ServiceResult<Page<Flow>> {
        let total = self.flows.count_by_architecture(architecture_id)?;
        collect_page(total, || self.flows.get_by_architecture(architecture_id, page))
    }

    /// Lists flows where the component is source or target, each flow once.
    pub fn get_flows_by_component(
        &self,
        component_id: ComponentId,
        page: PageRequest,
    ) -> ServiceResult<Page<Flow>> {
        let total = self.flows.count_by_component(component_id)?;
        collect_page(total, || self.flows.get_by_component(component_id, page))
    }

    pub fn list_flows(&self, page: PageRequest) -> ServiceResult<Page<Flow>> {
        let total = self.flows.count()?;
        collect_page(total, || self.flows.get_all(page))
    }

    pub fn update_flow(&self, id: FlowId, patch: &FlowPatch) -> ServiceResult<Flow> {
        if let Some(port) = patch.port {
            ensure_valid_port(port, "flow_update")?;
        }
        if patch.moves_endpoints() {
            let current = self.get_flow(id)?;
            let source = patch
                .source_component_id
                .unwrap_or(current.source_component_id);
            let target = patch
                .target_component_id
                .unwrap_or(current.target_component_id);
            ensure_distinct_endpoints(source, target, "flow_update")?;
            self.ensure_endpoints_in_architecture(
                current.architecture_id,
                source,
                target,
                "flow_update",
            )?;
        }

        let flow = self
            .flows
            .update(id, patch)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Flow, id))?;
        info!(
            "event=flow_update module=service status=ok flow_id={id} changed={}",
            !patch.is_empty()
        );
        Ok(flow)
    }

    pub fn delete_flow(&self, id: FlowId) -> ServiceResult<()> {
        if !self.flows.delete(id)? {
            return Err(ServiceError::not_found(EntityKind::Flow, id));
        }
        info!("event=flow_delete module=service status=ok flow_id={id}");
        Ok(())
    }

    fn ensure_endpoints_in_architecture(
        &self,
        architecture_id: ArchitectureId,
        source: ComponentId,
        target: ComponentId,
        event: &str,
    ) -> ServiceResult<()> {
        for component_id in [source, target] {
            let component = self
                .components
                .get_by_id(component_id)?
                .ok_or_else(|| ServiceError::not_found(EntityKind::Component, component_id))?;
            if component.architecture_id != architecture_id {
                warn!(
                    "event={event} module=service status=rejected reason=endpoint_outside_architecture component_id={component_id}"
                );
                return Err(ServiceError::InvalidArgument(format!(
                    "component {component_id} does not belong to architecture {architecture_id}"
                )));
            }
        }
        Ok(())
    }
}

fn ensure_distinct_endpoints(
    source: ComponentId,
    target: ComponentId,
    event: &str,
) -> ServiceResult<()> {
    if source == target {
        warn!("event={event} module=service status=rejected reason=self_loop component_id={source}");
        return Err(ServiceError::InvalidArgument(
            "flow source and target must be different components".to_string(),
        ));
    }
    Ok(())
}

fn ensure_valid_port(port: Option<u16>, event: &str) -> ServiceResult<()> {
    if port == Some(0) {
        warn!("event={event} module=service status=rejected reason=invalid_port");
        return Err(ServiceError::InvalidArgument(
            "flow port must be between 1 and 65535".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ensure_distinct_endpoints, ensure_valid_port};
    use crate::service::ErrorKind;
    use uuid::Uuid;

    #[test]
    fn self_loop_is_invalid_argument() {
        let id = Uuid::new_v4();
        let err = ensure_distinct_endpoints(id, id, "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(ensure_distinct_endpoints(id, Uuid::new_v4(), "test").is_ok());
    }

    #[test]
    fn port_zero_is_rejected_and_absent_port_is_fine() {
        assert!(ensure_valid_port(Some(0), "test").is_err());
        assert!(ensure_valid_port(Some(1), "test").is_ok());
        assert!(ensure_valid_port(Some(u16::MAX), "test").is_ok());
        assert!(ensure_valid_port(None, "test").is_ok());
    }
}
