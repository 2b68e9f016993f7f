//! Domain model for the security-architecture graph.
//!
//! # Responsibility
//! - Define the five entity views (project, architecture, zone, component,
//!   flow) and their create/patch inputs.
//! - Define pagination envelopes shared by list use-cases.
//!
//! # Invariants
//! - Every entity is identified by a stable v4 UUID assigned at creation.
//! - Parents own children; the owning edge is never re-pointed except for
//!   component zone and flow endpoints inside one architecture.
//! - There is no soft-delete state: entities are created, updated, deleted.

pub mod architecture;
pub mod component;
pub mod flow;
pub mod page;
pub mod project;
pub mod zone;
