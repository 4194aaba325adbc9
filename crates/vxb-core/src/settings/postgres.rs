use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{domain::UserId, errors::Error, settings::SettingsBackend, Result};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_settings (
    user_id    TEXT PRIMARY KEY,
    enabled    BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Settings kept in the `user_settings` table.
///
/// Disabling a user keeps the row with `enabled = false`.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Connect with the driver's default pool size and make sure the table exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().connect(database_url).await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        tracing::info!("connected to settings database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SettingsBackend for PostgresBackend {
    fn describe(&self) -> &'static str {
        "postgres"
    }

    async fn load(&self) -> Result<HashSet<UserId>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT user_id FROM user_settings WHERE enabled = TRUE")
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(UserId)
                    .map_err(|_| Error::External(format!("invalid user_id `{raw}` in user_settings")))
            })
            .collect()
    }

    async fn save(&self, user: UserId, enabled: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, enabled)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET enabled = EXCLUDED.enabled
            "#,
        )
        .bind(user.to_string())
        .bind(enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
