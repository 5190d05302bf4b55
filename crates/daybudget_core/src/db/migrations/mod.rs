//! Ledger schema steps.
//!
//! Step `n` in [`STEPS`] moves the schema from version `n` to `n + 1`; the
//! reached version is stored in `PRAGMA user_version`. Steps are append-only.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

const STEPS: &[&str] = &[
    include_str!("0001_init.sql"),
    include_str!("0002_expense_date_index.sql"),
];

/// Schema version a fully migrated database reports.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Brings `conn` up to [`latest_version`] in a single transaction.
///
/// A database already at the latest version is left alone. A newer one is
/// rejected with [`DbError::SchemaTooNew`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in (1u32..).zip(STEPS).skip(found as usize) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}
