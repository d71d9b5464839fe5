//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `spycat_core` linkage and the
//!   configured database.
//! - Keep output deterministic for quick local sanity checks.

use spycat_core::db::migrations::current_user_version;
use spycat_core::{
    init_logging, open_db, CatRepository, CoreConfig, MissionRepository, SqliteCatRepository,
    SqliteMissionRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("spycat error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("spycat_core ping={}", spycat_core::ping());
    println!("spycat_core version={}", spycat_core::core_version());

    let conn = open_db(&config.db_path)?;
    let cats = SqliteCatRepository::try_new(&conn)?.count_cats()?;
    let missions = SqliteMissionRepository::try_new(&conn)?.count_missions()?;

    println!("spycat_core db={}", config.db_path.display());
    println!("spycat_core schema_version={}", current_user_version(&conn)?);
    println!("spycat_core cats={cats} missions={missions}");
    Ok(())
}
