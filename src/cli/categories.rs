use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use crate::store::{get_connection, list_categories};

pub fn run(db: &str) -> Result<()> {
    let conn = get_connection(Path::new(db)).with_context(|| format!("opening database '{db}'"))?;
    let categories = list_categories(&conn).context("listing categories")?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Group", "Active"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.group),
            Cell::new(if cat.active { "yes" } else { "no" }),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
