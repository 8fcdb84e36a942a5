use super::models::WhitelistRow;
use crate::protection::antinuke::AntinukeSettings;
use sqlx::types::Json;
use sqlx::PgPool;

pub async fn load(pool: &PgPool, guild_id: i64) -> Result<Option<AntinukeSettings>, sqlx::Error> {
    let row: Option<(Json<AntinukeSettings>,)> =
        sqlx::query_as("SELECT settings FROM antinuke_settings WHERE guild_id = $1")
            .bind(guild_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(Json(settings),)| settings))
}

pub async fn save(
    pool: &PgPool,
    guild_id: i64,
    settings: &AntinukeSettings,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO antinuke_settings (guild_id, settings)
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

pub async fn whitelist_add(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
    added_by: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO antinuke_whitelist (guild_id, user_id, added_by)
        VALUES ($1, $2, $3)
        ON CONFLICT (guild_id, user_id) DO NOTHING
        "#,
    )
    .bind(guild_id)
    .bind(user_id)
    .bind(added_by)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn whitelist_remove(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM antinuke_whitelist WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id)
            .bind(user_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn whitelist_contains(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT user_id FROM antinuke_whitelist WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

pub async fn whitelist_list(
    pool: &PgPool,
    guild_id: i64,
) -> Result<Vec<WhitelistRow>, sqlx::Error> {
    sqlx::query_as::<_, WhitelistRow>(
        r#"
        SELECT guild_id, user_id, added_by, created_at
        FROM antinuke_whitelist
        WHERE guild_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await
}
