use blackmane_core::db::open_db_in_memory;
use blackmane_core::{
    Architecture, ArchitectureService, Component, ComponentService, ComponentType,
    CriticalityLevel, Flow, FlowProtocol, FlowService, NewArchitecture, NewComponent, NewFlow,
    NewProject, NewZone, Project, ProjectService, ProjectType, SqliteArchitectureRepository,
    SqliteComponentRepository, SqliteFlowRepository, SqliteProjectRepository,
    SqliteZoneRepository, TrustLevel, Zone, ZoneService,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Graph {
    project: Project,
    architecture: Architecture,
    dmz: Zone,
    internal: Zone,
    waf: Component,
    app: Component,
    db: Component,
    waf_to_app: Flow,
    app_to_db: Flow,
}

/// DMZ{WAF} -> Internal{App, DB} with flows WAF->App and App->DB.
fn build_graph(conn: &Connection) -> Graph {
    let project = ProjectService::new(SqliteProjectRepository::try_new(conn).unwrap())
        .create_project(&NewProject::new(
            "P1",
            ProjectType::Cloud,
            CriticalityLevel::High,
        ))
        .unwrap();
    let architecture = ArchitectureService::new(
        SqliteArchitectureRepository::try_new(conn).unwrap(),
        SqliteProjectRepository::try_new(conn).unwrap(),
    )
    .create_architecture(&NewArchitecture::new(project.id))
    .unwrap();

    let zones = ZoneService::new(
        SqliteZoneRepository::try_new(conn).unwrap(),
        SqliteArchitectureRepository::try_new(conn).unwrap(),
    );
    let dmz = zones
        .create_zone(&NewZone::new(architecture.id, "DMZ", TrustLevel::Low))
        .unwrap();
    let internal = zones
        .create_zone(&NewZone::new(architecture.id, "Internal", TrustLevel::High))
        .unwrap();

    let components = ComponentService::new(
        SqliteComponentRepository::try_new(conn).unwrap(),
        SqliteZoneRepository::try_new(conn).unwrap(),
    );
    let create = |zone: &Zone, name: &str, kind: ComponentType| {
        components
            .create_component(&NewComponent::new(architecture.id, zone.id, name, kind))
            .unwrap()
    };
    let waf = create(&dmz, "WAF", ComponentType::Firewall);
    let app = create(&internal, "App", ComponentType::Server);
    let db = create(&internal, "DB", ComponentType::Database);

    let flows = FlowService::new(
        SqliteFlowRepository::try_new(conn).unwrap(),
        SqliteComponentRepository::try_new(conn).unwrap(),
    );
    let waf_to_app = flows
        .create_flow(&NewFlow::new(
            architecture.id,
            waf.id,
            app.id,
            FlowProtocol::Https,
        ))
        .unwrap();
    let app_to_db = flows
        .create_flow(&NewFlow::new(
            architecture.id,
            app.id,
            db.id,
            FlowProtocol::Sql,
        ))
        .unwrap();

    Graph {
        project,
        architecture,
        dmz,
        internal,
        waf,
        app,
        db,
        waf_to_app,
        app_to_db,
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn row_exists(conn: &Connection, table: &str, id: Uuid) -> bool {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}

fn insert_analysis_with_finding(
    conn: &Connection,
    project_id: Uuid,
    component_id: Option<Uuid>,
    flow_id: Option<Uuid>,
) -> (Uuid, Uuid) {
    let analysis_id = Uuid::new_v4();
    let finding_id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO analyses (id, project_id) VALUES (?1, ?2);",
        [analysis_id.to_string(), project_id.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO findings (
            id, analysis_id, rule_id, rule_name, category, severity,
            title, description, impact, affected_component_id, affected_flow_id
        ) VALUES (?1, ?2, 'NET-001', 'rule', 'network', 'high', 't', 'd', 'i', ?3, ?4);",
        rusqlite::params![
            finding_id.to_string(),
            analysis_id.to_string(),
            component_id.map(|id| id.to_string()),
            flow_id.map(|id| id.to_string()),
        ],
    )
    .unwrap();
    (analysis_id, finding_id)
}

#[test]
fn deleting_component_removes_flows_touching_it() {
    let conn = open_db_in_memory().unwrap();
    let graph = build_graph(&conn);
    let components = ComponentService::new(
        SqliteComponentRepository::try_new(&conn).unwrap(),
        SqliteZoneRepository::try_new(&conn).unwrap(),
    );

    components.delete_component(graph.app.id).unwrap();

    assert!(!row_exists(&conn, "flows", graph.waf_to_app.id));
    assert!(!row_exists(&conn, "flows", graph.app_to_db.id));
    assert!(row_exists(&conn, "components", graph.waf.id));
    assert!(row_exists(&conn, "components", graph.db.id));
    assert!(row_exists(&conn, "zones", graph.internal.id));
}

#[test]
fn deleting_zone_removes_its_components_and_their_flows() {
    let conn = open_db_in_memory().unwrap();
    let graph = build_graph(&conn);
    let zones = ZoneService::new(
        SqliteZoneRepository::try_new(&conn).unwrap(),
        SqliteArchitectureRepository::try_new(&conn).unwrap(),
    );

    zones.delete_zone(graph.dmz.id).unwrap();

    assert!(!row_exists(&conn, "components", graph.waf.id));
    assert!(!row_exists(&conn, "flows", graph.waf_to_app.id));
    assert!(row_exists(&conn, "flows", graph.app_to_db.id));
    assert_eq!(count(&conn, "components"), 2);
}

#[test]
fn deleting_architecture_removes_the_whole_graph() {
    let conn = open_db_in_memory().unwrap();
    let graph = build_graph(&conn);
    let architectures = ArchitectureService::new(
        SqliteArchitectureRepository::try_new(&conn).unwrap(),
        SqliteProjectRepository::try_new(&conn).unwrap(),
    );

    architectures
        .delete_architecture(graph.architecture.id)
        .unwrap();

    assert_eq!(count(&conn, "zones"), 0);
    assert_eq!(count(&conn, "components"), 0);
    assert_eq!(count(&conn, "flows"), 0);
    assert!(row_exists(&conn, "projects", graph.project.id));
}

#[test]
fn deleting_project_removes_architecture_and_analyses() {
    let conn = open_db_in_memory().unwrap();
    let graph = build_graph(&conn);
    let (analysis_id, finding_id) =
        insert_analysis_with_finding(&conn, graph.project.id, Some(graph.waf.id), None);
    let projects = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());

    projects.delete_project(graph.project.id).unwrap();

    assert!(!row_exists(&conn, "architectures", graph.architecture.id));
    assert!(!row_exists(&conn, "analyses", analysis_id));
    assert!(!row_exists(&conn, "findings", finding_id));
    for table in ["projects", "architectures", "zones", "components", "flows"] {
        assert_eq!(count(&conn, table), 0, "table {table} not empty");
    }
}

#[test]
fn findings_outlive_the_component_and_flow_they_reference() {
    let conn = open_db_in_memory().unwrap();
    let graph = build_graph(&conn);
    let (_, finding_id) = insert_analysis_with_finding(
        &conn,
        graph.project.id,
        Some(graph.db.id),
        Some(graph.app_to_db.id),
    );
    let components = ComponentService::new(
        SqliteComponentRepository::try_new(&conn).unwrap(),
        SqliteZoneRepository::try_new(&conn).unwrap(),
    );

    components.delete_component(graph.db.id).unwrap();

    let (component_ref, flow_ref): (Option<String>, Option<String>) = conn
        .query_row(
            "SELECT affected_component_id, affected_flow_id FROM findings WHERE id = ?1;",
            [finding_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(component_ref, None);
    assert_eq!(flow_ref, None);
}
