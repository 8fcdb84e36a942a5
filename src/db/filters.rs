use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

/// Per-guild message filter settings. Stored as JSONB so new filter kinds
/// deserialize against older documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub invites: bool,
    #[serde(default)]
    pub links: bool,
    #[serde(default)]
    pub words: Vec<String>,
}

pub async fn load(pool: &PgPool, guild_id: i64) -> Result<FilterSettings, sqlx::Error> {
    let row: Option<(Json<FilterSettings>,)> =
        sqlx::query_as("SELECT settings FROM filter_settings WHERE guild_id = $1")
            .bind(guild_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(Json(settings),)| settings).unwrap_or_default())
}

pub async fn save(
    pool: &PgPool,
    guild_id: i64,
    settings: &FilterSettings,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO filter_settings (guild_id, settings)
        VALUES ($1, $2)
        ON CONFLICT (guild_id) DO UPDATE SET settings = EXCLUDED.settings
        "#,
    )
    .bind(guild_id)
    .bind(Json(settings))
    .execute(pool)
    .await?;

    Ok(())
}
