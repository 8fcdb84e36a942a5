use crate::protection::antiraid::AntiraidSettings;
use sqlx::types::Json;
use sqlx::PgPool;

pub async fn load(pool: &PgPool, guild_id: i64) -> Result<Option<AntiraidSettings>, sqlx::Error> {
    let row: Option<(Json<AntiraidSettings>,)> =
        sqlx::query_as("SELECT settings FROM antiraid_settings WHERE guild_id = $1")
            .bind(guild_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(Json(settings),)| settings))
}

pub async fn save(
    pool: &PgPool,
    guild_id: i64,
    settings: &AntiraidSettings,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO antiraid_settings (guild_id, settings)
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
