//! DDL for the `settings` table.

use sqlx_core::query::query;
use sqlx_postgres::PgPool;
use tracing::{debug, instrument};

use crate::error::{PostgresError, Result};

const CREATE_SETTINGS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key         TEXT PRIMARY KEY,
        value       TEXT NOT NULL,
        type        TEXT NOT NULL CHECK (type IN ('boolean', 'string', 'number', 'json')),
        category    TEXT NOT NULL DEFAULT 'general',
        is_public   BOOLEAN NOT NULL DEFAULT FALSE,
        description TEXT,
        updated_by  TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_CATEGORY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS settings_category_idx ON settings (category, key)";

/// Creates the `settings` table and its index if they do not exist.
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in [CREATE_SETTINGS_TABLE, CREATE_CATEGORY_INDEX] {
        query(statement)
            .execute(pool)
            .await
            .map_err(|e| PostgresError::Schema(e.to_string()))?;
    }
    debug!("settings schema ready");
    Ok(())
}
