use blackmane_core::db::open_db_in_memory;
use blackmane_core::{
    Architecture, ArchitectureService, Component, ComponentPatch, ComponentRepository,
    ComponentService, ComponentType, CriticalityLevel, EntityKind, ErrorKind, ModelLimits,
    NewArchitecture, NewComponent, NewProject, NewZone, PageRequest, ProjectService, ProjectType,
    ServiceError, SqliteArchitectureRepository, SqliteComponentRepository,
    SqliteProjectRepository, SqliteZoneRepository, TrustLevel, Zone, ZonePatch, ZoneRepository,
    ZoneService,
};
use rusqlite::Connection;
use uuid::Uuid;

type Zones<'a> = ZoneService<SqliteZoneRepository<'a>, SqliteArchitectureRepository<'a>>;
type Components<'a> = ComponentService<SqliteComponentRepository<'a>, SqliteZoneRepository<'a>>;

fn zone_service(conn: &Connection) -> Zones<'_> {
    ZoneService::new(
        SqliteZoneRepository::try_new(conn).unwrap(),
        SqliteArchitectureRepository::try_new(conn).unwrap(),
    )
}

fn component_service(conn: &Connection) -> Components<'_> {
    ComponentService::new(
        SqliteComponentRepository::try_new(conn).unwrap(),
        SqliteZoneRepository::try_new(conn).unwrap(),
    )
}

fn create_architecture(conn: &Connection, name: &str) -> Architecture {
    let project = ProjectService::new(SqliteProjectRepository::try_new(conn).unwrap())
        .create_project(&NewProject::new(
            name,
            ProjectType::Cloud,
            CriticalityLevel::Medium,
        ))
        .unwrap();
    ArchitectureService::new(
        SqliteArchitectureRepository::try_new(conn).unwrap(),
        SqliteProjectRepository::try_new(conn).unwrap(),
    )
    .create_architecture(&NewArchitecture::new(project.id))
    .unwrap()
}

fn create_zone(conn: &Connection, architecture: &Architecture, name: &str) -> Zone {
    zone_service(conn)
        .create_zone(&NewZone::new(architecture.id, name, TrustLevel::Low))
        .unwrap()
}

fn create_component(conn: &Connection, zone: &Zone, name: &str) -> Component {
    component_service(conn)
        .create_component(&NewComponent::new(
            zone.architecture_id,
            zone.id,
            name,
            ComponentType::Server,
        ))
        .unwrap()
}

#[test]
fn create_zone_and_list_by_architecture() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let service = zone_service(&conn);

    let mut input = NewZone::new(architecture.id, "DMZ", TrustLevel::Low);
    input.description = Some("edge network".to_string());
    let dmz = service.create_zone(&input).unwrap();
    let internal = create_zone(&conn, &architecture, "Internal");

    assert_eq!(service.get_zone(dmz.id).unwrap(), dmz);
    assert_eq!(dmz.trust_level, TrustLevel::Low);
    assert_eq!(dmz.description.as_deref(), Some("edge network"));

    let page = service
        .get_zones_by_architecture(architecture.id, PageRequest::new(0, 1))
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items, vec![dmz]);

    let rest = service
        .get_zones_by_architecture(architecture.id, PageRequest::new(1, 10))
        .unwrap();
    assert_eq!(rest.items, vec![internal]);
}

#[test]
fn zone_requires_existing_architecture_and_valid_name() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let service = zone_service(&conn);

    let missing = Uuid::new_v4();
    match service
        .create_zone(&NewZone::new(missing, "DMZ", TrustLevel::Low))
        .unwrap_err()
    {
        ServiceError::NotFound { entity, id } => {
            assert_eq!(entity, EntityKind::Architecture);
            assert_eq!(id, missing);
        }
        other => panic!("unexpected error: {other}"),
    }

    let long_name = "z".repeat(101);
    for name in ["", " \t", long_name.as_str()] {
        let err = service
            .create_zone(&NewZone::new(architecture.id, name, TrustLevel::High))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "name {name:?}");
    }
    assert_eq!(service.list_zones(PageRequest::default()).unwrap().total, 0);
}

#[test]
fn zone_capacity_limit_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let service = zone_service(&conn).with_limits(ModelLimits {
        max_zones: 2,
        ..ModelLimits::default()
    });

    service
        .create_zone(&NewZone::new(architecture.id, "a", TrustLevel::Low))
        .unwrap();
    service
        .create_zone(&NewZone::new(architecture.id, "b", TrustLevel::Low))
        .unwrap();
    let err = service
        .create_zone(&NewZone::new(architecture.id, "c", TrustLevel::Low))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Limits are per architecture.
    let other = create_architecture(&conn, "P2");
    service
        .create_zone(&NewZone::new(other.id, "a", TrustLevel::Low))
        .unwrap();
}

#[test]
fn update_zone_patches_fields() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let zone = create_zone(&conn, &architecture, "DMZ");
    let service = zone_service(&conn);

    let patch = ZonePatch {
        trust_level: Some(TrustLevel::Untrusted),
        description: Some(Some("internet facing".to_string())),
        ..ZonePatch::default()
    };
    let updated = service.update_zone(zone.id, &patch).unwrap();
    assert_eq!(updated.name, "DMZ");
    assert_eq!(updated.trust_level, TrustLevel::Untrusted);
    assert_eq!(updated.description.as_deref(), Some("internet facing"));
    assert_eq!(updated.created_at, zone.created_at);

    assert_eq!(
        service
            .update_zone(Uuid::new_v4(), &patch)
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn create_component_with_controls() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let zone = create_zone(&conn, &architecture, "DMZ");
    let service = component_service(&conn);

    let mut input = NewComponent::new(architecture.id, zone.id, "WAF", ComponentType::Firewall);
    input.controls.has_logging = true;
    input.controls.encryption_in_transit = true;
    let created = service.create_component(&input).unwrap();

    let loaded = service.get_component(created.id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.component_type, ComponentType::Firewall);
    assert!(loaded.controls.has_logging);
    assert!(loaded.controls.encryption_in_transit);
    assert!(!loaded.controls.requires_mfa);
    assert!(!loaded.controls.has_admin_interface);
    assert!(!loaded.controls.encryption_at_rest);
}

#[test]
fn component_requires_zone_in_same_architecture() {
    let conn = open_db_in_memory().unwrap();
    let first = create_architecture(&conn, "P1");
    let second = create_architecture(&conn, "P2");
    let foreign_zone = create_zone(&conn, &second, "Other");
    let service = component_service(&conn);

    let missing_zone = Uuid::new_v4();
    match service
        .create_component(&NewComponent::new(
            first.id,
            missing_zone,
            "WAF",
            ComponentType::Firewall,
        ))
        .unwrap_err()
    {
        ServiceError::NotFound { entity, id } => {
            assert_eq!(entity, EntityKind::Zone);
            assert_eq!(id, missing_zone);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = service
        .create_component(&NewComponent::new(
            first.id,
            foreign_zone.id,
            "WAF",
            ComponentType::Firewall,
        ))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(service.list_components(PageRequest::default()).unwrap().total, 0);
}

#[test]
fn store_rejects_cross_architecture_component_without_service() {
    let conn = open_db_in_memory().unwrap();
    let first = create_architecture(&conn, "P1");
    let second = create_architecture(&conn, "P2");
    let foreign_zone = create_zone(&conn, &second, "Other");

    let repo = SqliteComponentRepository::try_new(&conn).unwrap();
    let err = repo
        .create(&NewComponent::new(
            first.id,
            foreign_zone.id,
            "WAF",
            ComponentType::Firewall,
        ))
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "unexpected error: {err}");
}

#[test]
fn rejected_zone_move_leaves_component_untouched() {
    let conn = open_db_in_memory().unwrap();
    let first = create_architecture(&conn, "P1");
    let second = create_architecture(&conn, "P2");
    let home = create_zone(&conn, &first, "DMZ");
    let foreign_zone = create_zone(&conn, &second, "Other");
    let component = create_component(&conn, &home, "web-1");

    let repo = SqliteComponentRepository::try_new(&conn).unwrap();
    let patch = ComponentPatch {
        name: Some("renamed".to_string()),
        zone_id: Some(foreign_zone.id),
        ..ComponentPatch::default()
    };
    let err = repo.update(component.id, &patch).unwrap_err();
    assert!(err.is_foreign_key_violation(), "unexpected error: {err}");

    let stored = repo.get_by_id(component.id).unwrap().unwrap();
    assert_eq!(stored.name, "web-1");
    assert_eq!(stored.zone_id, home.id);
    assert_eq!(stored, component);
}

#[test]
fn create_within_limit_counts_inside_the_insert() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let zones = SqliteZoneRepository::try_new(&conn).unwrap();

    let first = zones
        .create_within_limit(&NewZone::new(architecture.id, "a", TrustLevel::Low), 1)
        .unwrap();
    assert!(first.is_some());
    let second = zones
        .create_within_limit(&NewZone::new(architecture.id, "b", TrustLevel::Low), 1)
        .unwrap();
    assert_eq!(second, None);
    assert_eq!(zones.count_by_architecture(architecture.id).unwrap(), 1);

    let zone = first.unwrap();
    let components = SqliteComponentRepository::try_new(&conn).unwrap();
    let input = NewComponent::new(architecture.id, zone.id, "web", ComponentType::Server);
    assert!(components.create_within_limit(&input, 1).unwrap().is_some());
    assert_eq!(components.create_within_limit(&input, 1).unwrap(), None);
    assert_eq!(components.count_by_architecture(architecture.id).unwrap(), 1);
}

#[test]
fn components_list_by_zone_and_architecture_with_totals() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let dmz = create_zone(&conn, &architecture, "DMZ");
    let internal = create_zone(&conn, &architecture, "Internal");
    let waf = create_component(&conn, &dmz, "WAF");
    let proxy = create_component(&conn, &dmz, "Proxy");
    let db = create_component(&conn, &internal, "DB");
    let service = component_service(&conn);

    let by_zone = service
        .get_components_by_zone(dmz.id, PageRequest::new(1, 5))
        .unwrap();
    assert_eq!(by_zone.total, 2);
    assert_eq!(by_zone.items, vec![proxy]);

    let by_architecture = service
        .get_components_by_architecture(architecture.id, PageRequest::default())
        .unwrap();
    assert_eq!(by_architecture.total, 3);
    let ids: Vec<Uuid> = by_architecture.items.iter().map(|c| c.id).collect();
    assert_eq!(ids[0], waf.id);
    assert_eq!(ids[2], db.id);
}

#[test]
fn component_moves_between_zones_of_its_architecture_only() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let other = create_architecture(&conn, "P2");
    let dmz = create_zone(&conn, &architecture, "DMZ");
    let internal = create_zone(&conn, &architecture, "Internal");
    let foreign = create_zone(&conn, &other, "Foreign");
    let component = create_component(&conn, &dmz, "App");
    let service = component_service(&conn);

    let moved = service
        .update_component(
            component.id,
            &ComponentPatch {
                zone_id: Some(internal.id),
                requires_mfa: Some(true),
                ..ComponentPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.zone_id, internal.id);
    assert!(moved.controls.requires_mfa);
    assert_eq!(moved.name, "App");

    let err = service
        .update_component(
            component.id,
            &ComponentPatch {
                zone_id: Some(foreign.id),
                ..ComponentPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let missing = service
        .update_component(
            Uuid::new_v4(),
            &ComponentPatch {
                zone_id: Some(internal.id),
                ..ComponentPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    assert_eq!(service.get_component(component.id).unwrap().zone_id, internal.id);
}

#[test]
fn component_capacity_limit_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let zone = create_zone(&conn, &architecture, "DMZ");
    let service = component_service(&conn).with_limits(ModelLimits {
        max_components: 1,
        ..ModelLimits::default()
    });

    let input = NewComponent::new(architecture.id, zone.id, "one", ComponentType::Vpn);
    service.create_component(&input).unwrap();
    assert_eq!(
        service.create_component(&input).unwrap_err().kind(),
        ErrorKind::Conflict
    );
}

#[test]
fn delete_component_then_lookup_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let architecture = create_architecture(&conn, "P1");
    let zone = create_zone(&conn, &architecture, "DMZ");
    let component = create_component(&conn, &zone, "App");
    let service = component_service(&conn);

    service.delete_component(component.id).unwrap();
    assert_eq!(
        service.get_component(component.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.delete_component(component.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
