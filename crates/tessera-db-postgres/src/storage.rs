//! `SettingsStore` over the `settings` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use tessera_core::{Setting, SettingType, SettingsFilter, SettingsStore, StoreError};
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::{Result, is_unique_violation};
use crate::schema::ensure_schema;

type SettingRow = (
    String,
    String,
    String,
    String,
    bool,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

const SELECT_COLUMNS: &str = "key, value, type, category, is_public, description, updated_by, created_at, updated_at";

/// PostgreSQL-backed settings store.
#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using `config`, creating the schema when configured to.
    #[instrument(skip(config), fields(url = %config.redacted_url()))]
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        info!(
            max_connections = config.max_connections,
            "Connecting settings store"
        );
        let pool = config.pool_options().connect(&config.url).await?;
        if config.ensure_schema {
            ensure_schema(&pool).await?;
        }
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `settings` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        ensure_schema(&self.pool).await
    }
}

fn into_setting(row: SettingRow) -> std::result::Result<Setting, StoreError> {
    let (key, value, ty, category, is_public, description, updated_by, created_at, updated_at) =
        row;
    let setting_type: SettingType = ty
        .parse()
        .map_err(|e| StoreError::internal(format!("Setting '{key}' has {e}")))?;

    Ok(Setting {
        key,
        value,
        setting_type,
        category,
        is_public,
        description,
        updated_by,
        created_at,
        updated_at,
    })
}

fn database_error(operation: &str, err: SqlxError) -> StoreError {
    StoreError::database(format!("Failed to {operation}: {err}"))
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn find_by_key(&self, key: &str) -> std::result::Result<Option<Setting>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM settings WHERE key = $1");
        let row: Option<SettingRow> = query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("get setting", e))?;

        row.map(into_setting).transpose()
    }

    async fn find_all(
        &self,
        filter: &SettingsFilter,
    ) -> std::result::Result<Vec<Setting>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM settings
            WHERE ($1::text IS NULL OR category = $1)
              AND (NOT $2 OR is_public)
              AND ($3::text[] IS NULL OR key = ANY($3))
            ORDER BY category, key
            "#
        );
        let rows: Vec<SettingRow> = query_as(&sql)
            .bind(filter.category.clone())
            .bind(filter.public_only)
            .bind(filter.keys.clone())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("list settings", e))?;

        debug!(rows = rows.len(), "settings loaded");
        rows.into_iter().map(into_setting).collect()
    }

    async fn update(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> std::result::Result<u64, StoreError> {
        let result = query(
            r#"
            UPDATE settings
            SET value = $2, updated_by = $3, updated_at = NOW()
            WHERE key = $1
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("update setting", e))?;

        Ok(result.rows_affected())
    }

    async fn create(&self, setting: &Setting) -> std::result::Result<Setting, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO settings
                (key, value, type, category, is_public, description, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SELECT_COLUMNS}
            "#
        );
        let row: SettingRow = query_as(&sql)
            .bind(&setting.key)
            .bind(&setting.value)
            .bind(setting.setting_type.as_str())
            .bind(&setting.category)
            .bind(setting.is_public)
            .bind(&setting.description)
            .bind(&setting.updated_by)
            .bind(setting.created_at)
            .bind(setting.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict {
                        key: setting.key.clone(),
                    }
                } else {
                    database_error("create setting", e)
                }
            })?;

        into_setting(row)
    }

    async fn delete(&self, key: &str) -> std::result::Result<bool, StoreError> {
        let result = query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("delete setting", e))?;

        Ok(result.rows_affected() > 0)
    }
}
