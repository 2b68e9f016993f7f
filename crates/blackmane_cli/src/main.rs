//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load configuration from `BLACKMANE_*` variables and open the store.
//! - Print version, schema version and entity counts as `key=value` lines.

use blackmane_core::db::migrations::{latest_version, schema_version};
use blackmane_core::{
    ArchitectureRepository, ComponentRepository, CoreConfig, FlowRepository, ProjectRepository,
    SqliteArchitectureRepository, SqliteComponentRepository, SqliteFlowRepository,
    SqliteProjectRepository, SqliteZoneRepository, ZoneRepository,
};
use log::{error, info};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_probe module=cli status=error error={err}");
            eprintln!("blackmane: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    let logging_active = blackmane_core::init_from_config(&config)?;

    println!("blackmane_core ping={}", blackmane_core::ping());
    println!("blackmane_core version={}", blackmane_core::core_version());
    println!("logging active={logging_active}");

    let conn = blackmane_core::open_db(&config.db_path)?;
    println!("db path={}", config.db_path.display());
    println!(
        "schema version={} latest={}",
        schema_version(&conn)?,
        latest_version()
    );

    let projects = SqliteProjectRepository::try_new(&conn)?.count()?;
    let architectures = SqliteArchitectureRepository::try_new(&conn)?.count()?;
    let zones = SqliteZoneRepository::try_new(&conn)?.count()?;
    let components = SqliteComponentRepository::try_new(&conn)?.count()?;
    let flows = SqliteFlowRepository::try_new(&conn)?.count()?;
    println!(
        "counts projects={projects} architectures={architectures} zones={zones} components={components} flows={flows}"
    );
    info!(
        "event=cli_probe module=cli status=ok projects={projects} architectures={architectures} flows={flows}"
    );
    Ok(())
}
