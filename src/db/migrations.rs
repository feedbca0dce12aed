use anyhow::{Context, Result};
use log::warn;
use rusqlite::Connection;

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Brings the schema to [`CURRENT_SCHEMA_VERSION`].
///
/// There are no incremental migrations: any other stored version drops the
/// table and starts over with an empty history.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    if version != 0 {
        warn!(
            "Schema version {} does not match {}; dropping sleep history",
            version, CURRENT_SCHEMA_VERSION
        );
        tx.execute_batch(
            "DROP INDEX IF EXISTS idx_sleep_history_start;
             DROP TABLE IF EXISTS sleep_history;",
        )
        .context("failed to drop outdated schema")?;
    }

    tx.execute_batch(include_str!("schemas/schema_v1.sql"))
        .context("failed to execute schema_v1.sql")?;

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit schema")?;

    Ok(())
}
