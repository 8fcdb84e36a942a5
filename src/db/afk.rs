use super::models::AfkRow;
use sqlx::PgPool;

pub async fn set(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
    reason: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO afk (guild_id, user_id, reason)
        VALUES ($1, $2, $3)
        ON CONFLICT (guild_id, user_id) DO UPDATE SET reason = EXCLUDED.reason, since = now()
        "#,
    )
    .bind(guild_id)
    .bind(user_id)
    .bind(reason)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Option<AfkRow>, sqlx::Error> {
    sqlx::query_as::<_, AfkRow>(
        "SELECT guild_id, user_id, reason, since FROM afk WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Clears AFK status and returns the removed row, if any.
pub async fn remove(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Option<AfkRow>, sqlx::Error> {
    sqlx::query_as::<_, AfkRow>(
        r#"
        DELETE FROM afk
        WHERE guild_id = $1 AND user_id = $2
        RETURNING guild_id, user_id, reason, since
        "#,
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
