use super::models::StickyRow;
use sqlx::PgPool;

const STICKY_COLUMNS: &str = "channel_id, guild_id, content, last_message_id, created_by, created_at";

pub async fn upsert(
    pool: &PgPool,
    channel_id: i64,
    guild_id: i64,
    content: &str,
    created_by: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stickies (channel_id, guild_id, content, created_by)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (channel_id) DO UPDATE
            SET content = EXCLUDED.content,
                created_by = EXCLUDED.created_by,
                last_message_id = NULL,
                created_at = now()
        "#,
    )
    .bind(channel_id)
    .bind(guild_id)
    .bind(content)
    .bind(created_by)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &PgPool, channel_id: i64) -> Result<Option<StickyRow>, sqlx::Error> {
    sqlx::query_as::<_, StickyRow>(&format!(
        "SELECT {STICKY_COLUMNS} FROM stickies WHERE channel_id = $1"
    ))
    .bind(channel_id)
    .fetch_optional(pool)
    .await
}

pub async fn set_last_message(
    pool: &PgPool,
    channel_id: i64,
    message_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE stickies SET last_message_id = $2 WHERE channel_id = $1")
        .bind(channel_id)
        .bind(message_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete(pool: &PgPool, channel_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stickies WHERE channel_id = $1")
        .bind(channel_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list(pool: &PgPool, guild_id: i64) -> Result<Vec<StickyRow>, sqlx::Error> {
    sqlx::query_as::<_, StickyRow>(&format!(
        "SELECT {STICKY_COLUMNS} FROM stickies WHERE guild_id = $1 ORDER BY channel_id"
    ))
    .bind(guild_id)
    .fetch_all(pool)
    .await
}
