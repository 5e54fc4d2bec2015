use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::banks::Bank;
use crate::categorizer::Categorizer;
use crate::error::Result;
use crate::reader::CsvSource;
use crate::store::{self, Writer};
use crate::transaction::AccountType;

#[derive(Debug)]
pub struct ImportStats {
    pub imported: usize,
}

/// Run one source file through the full pipeline: adapter → categorizer →
/// scoped write. Any error aborts the run and rolls the write scope back;
/// there is no partial-success mode.
pub fn import_file(
    conn: &Connection,
    file_path: &Path,
    bank: Bank,
    account_type: Option<AccountType>,
    mapping_path: &Path,
) -> Result<ImportStats> {
    let categorizer = Categorizer::new(mapping_path, store::category_ids(conn)?)?;
    let mut source = match account_type {
        Some(account_type) => CsvSource::open_with_account_type(file_path, bank, account_type)?,
        None => CsvSource::open(file_path, bank)?,
    };

    let mut writer = Writer::new(conn);
    writer.open()?;
    let mut imported = 0usize;
    for record in source.records() {
        let transaction = record?.into_generic()?;
        writer.store(&categorizer.categorize(transaction))?;
        imported += 1;
    }
    writer.commit()?;

    info!(
        imported,
        bank = bank.key(),
        file = %file_path.display(),
        "import complete"
    );
    Ok(ImportStats { imported })
}
