use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::banks::Bank;
use crate::importer::import_file;
use crate::store::get_connection;
use crate::transaction::AccountType;

pub fn run(
    db: &str,
    file: &str,
    bank: &str,
    account_type: Option<&str>,
    mapping: &str,
) -> Result<()> {
    let Some(bank) = Bank::from_key(bank) else {
        bail!("unknown bank '{bank}' (expected one of: revolut, airbank, raiffeisen)");
    };
    let account_type = account_type
        .map(|key| {
            AccountType::from_key(key)
                .ok_or_else(|| anyhow!("unknown account type '{key}' (expected basic or savings)"))
        })
        .transpose()?;

    let conn = get_connection(Path::new(db)).with_context(|| format!("opening database '{db}'"))?;
    let stats = import_file(&conn, Path::new(file), bank, account_type, Path::new(mapping))
        .with_context(|| format!("importing '{file}'"))?;

    println!("{} transactions imported from {file}", stats.imported);
    Ok(())
}
