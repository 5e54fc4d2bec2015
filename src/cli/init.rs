use std::path::Path;

use anyhow::{Context, Result};

use crate::store::{get_connection, init_db};

pub fn run(db: &str) -> Result<()> {
    let conn = get_connection(Path::new(db)).with_context(|| format!("opening database '{db}'"))?;
    init_db(&conn).context("initializing database")?;
    println!("Database ready at {db}");
    Ok(())
}
