use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::error::{MonetaError, Result};
use crate::transaction::{CategorizedTransaction, Category};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category_group TEXT NOT NULL,
    active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    account_type TEXT NOT NULL,
    payment_type TEXT,
    payment_instruction TEXT,
    payment_category TEXT,
    currency TEXT NOT NULL,
    amount REAL NOT NULL,
    fee REAL,
    balance REAL,
    description TEXT,
    counterparty TEXT,
    counterparty_account_name TEXT,
    payment_date TEXT,
    started_date TEXT,
    due_date TEXT,
    completed_date TEXT,
    is_completed INTEGER,
    category_id INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);
";

// (name, group)
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Nájem a energie", "Bydlení"),
    ("Domácnost", "Bydlení"),
    ("Jídlo a potraviny", "Jídlo"),
    ("Restaurace", "Jídlo"),
    ("Doprava", "Doprava"),
    ("Auto", "Doprava"),
    ("Zdraví", "Zdraví"),
    ("Sport", "Volný čas"),
    ("Zábava", "Volný čas"),
    ("Cestování", "Volný čas"),
    ("Oblečení", "Nákupy"),
    ("Elektronika", "Nákupy"),
    ("Předplatné", "Služby"),
    ("Poplatky", "Finance"),
    ("Převody", "Finance"),
    ("Spoření a investice", "Finance"),
    ("Výběr hotovosti", "Finance"),
    ("Mzda", "Příjem"),
    ("Ostatní příjem", "Příjem"),
    ("Nezařazený výdaj", "Ostatní"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, group) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, category_group) VALUES (?1, ?2)",
                rusqlite::params![name, group],
            )?;
        }
    }
    Ok(())
}

/// Snapshot of the category name → id mapping, taken once at categorizer
/// construction.
pub fn category_ids(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT name, id FROM categories WHERE active = 1")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    let mut map = HashMap::new();
    for row in rows {
        let (name, id) = row?;
        map.insert(name, id);
    }
    Ok(map)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_group, active FROM categories ORDER BY category_group, name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            group: row.get(2)?,
            active: row.get(3)?,
        })
    })?;
    rows.map(|r| r.map_err(MonetaError::from)).collect()
}

const DATE_COLUMN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Scoped writer for categorized transactions. A scope must be opened
/// before the first `store`; everything stored in the scope becomes visible
/// on `commit`. Dropping an open scope rolls it back, so an abnormal exit
/// exposes no partial import.
pub struct Writer<'c> {
    conn: &'c Connection,
    open: bool,
}

impl<'c> Writer<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, open: false }
    }

    pub fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(MonetaError::State("write scope is already open".to_string()));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.open = true;
        Ok(())
    }

    pub fn store(&mut self, categorized: &CategorizedTransaction) -> Result<()> {
        if !self.open {
            return Err(MonetaError::State(
                "store called outside an open write scope".to_string(),
            ));
        }
        let tx = &categorized.transaction;
        let date =
            |d: &Option<NaiveDateTime>| d.map(|d| d.format(DATE_COLUMN_FORMAT).to_string());
        self.conn.execute(
            "INSERT INTO transactions (
                id, source, account_type,
                payment_type, payment_instruction, payment_category,
                currency, amount, fee, balance,
                description, counterparty, counterparty_account_name,
                payment_date, started_date, due_date, completed_date,
                is_completed, category_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            rusqlite::params![
                tx.id,
                tx.source,
                tx.account_type.as_str(),
                tx.payment_type,
                tx.payment_instruction,
                tx.payment_category,
                tx.currency,
                tx.amount,
                tx.fee,
                tx.balance,
                tx.description,
                tx.counterparty,
                tx.counterparty_account_name,
                date(&tx.payment_date),
                date(&tx.started_date),
                date(&tx.due_date),
                date(&tx.completed_date),
                tx.is_completed,
                categorized.category_id,
            ],
        )?;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if !self.open {
            return Err(MonetaError::State(
                "commit called outside an open write scope".to_string(),
            ));
        }
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }
}

impl Drop for Writer<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::DEFAULT_CATEGORY;
    use crate::transaction::sample_transaction;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn sample_categorized(category_id: i64) -> CategorizedTransaction {
        CategorizedTransaction {
            transaction: sample_transaction(),
            category_id,
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["categories", "transactions"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, DEFAULT_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_seed_includes_default_category() {
        let (_dir, conn) = test_db();
        let ids = category_ids(&conn).unwrap();
        assert!(ids.contains_key(DEFAULT_CATEGORY));
        assert_eq!(ids.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_list_categories_reads_groups() {
        let (_dir, conn) = test_db();
        let cats = list_categories(&conn).unwrap();
        let uncategorized = cats.iter().find(|c| c.name == DEFAULT_CATEGORY).unwrap();
        assert_eq!(uncategorized.group, "Ostatní");
        assert!(uncategorized.active);
    }

    #[test]
    fn test_store_outside_open_scope_is_state_error() {
        let (_dir, conn) = test_db();
        let ids = category_ids(&conn).unwrap();
        let mut writer = Writer::new(&conn);
        let err = writer.store(&sample_categorized(ids[DEFAULT_CATEGORY])).unwrap_err();
        assert!(matches!(err, MonetaError::State(_)));
    }

    #[test]
    fn test_commit_outside_open_scope_is_state_error() {
        let (_dir, conn) = test_db();
        let mut writer = Writer::new(&conn);
        assert!(matches!(writer.commit(), Err(MonetaError::State(_))));
    }

    #[test]
    fn test_double_open_is_state_error() {
        let (_dir, conn) = test_db();
        let mut writer = Writer::new(&conn);
        writer.open().unwrap();
        assert!(matches!(writer.open(), Err(MonetaError::State(_))));
        writer.commit().unwrap();
    }

    #[test]
    fn test_committed_scope_is_visible_to_fresh_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let conn = get_connection(&path).unwrap();
            init_db(&conn).unwrap();
            let ids = category_ids(&conn).unwrap();
            let mut writer = Writer::new(&conn);
            writer.open().unwrap();
            writer.store(&sample_categorized(ids[DEFAULT_CATEGORY])).unwrap();
            writer.commit().unwrap();
        }
        let conn = get_connection(&path).unwrap();
        let (amount, category_id): (f64, i64) = conn
            .query_row(
                "SELECT amount, category_id FROM transactions",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(amount, -12.5);
        let ids = category_ids(&conn).unwrap();
        assert_eq!(category_id, ids[DEFAULT_CATEGORY]);
    }

    #[test]
    fn test_dropped_scope_exposes_no_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let conn = get_connection(&path).unwrap();
            init_db(&conn).unwrap();
            let ids = category_ids(&conn).unwrap();
            let mut writer = Writer::new(&conn);
            writer.open().unwrap();
            writer.store(&sample_categorized(ids[DEFAULT_CATEGORY])).unwrap();
            // Dropped without commit: the abnormal-exit path.
        }
        let conn = get_connection(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_stored_dates_use_column_format() {
        let (_dir, conn) = test_db();
        let ids = category_ids(&conn).unwrap();
        let mut writer = Writer::new(&conn);
        writer.open().unwrap();
        writer.store(&sample_categorized(ids[DEFAULT_CATEGORY])).unwrap();
        writer.commit().unwrap();
        let started: String = conn
            .query_row("SELECT started_date FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(started, "2023-01-05 14:30:59");
    }
}
