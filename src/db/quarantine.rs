use super::models::QuarantineRow;
use sqlx::PgPool;

pub async fn upsert(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
    previous_roles: &[i64],
    moderator_id: i64,
    reason: Option<&str>,
    source: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO quarantine (guild_id, user_id, previous_roles, moderator_id, reason, source)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (guild_id, user_id) DO UPDATE
            SET previous_roles = EXCLUDED.previous_roles,
                moderator_id = EXCLUDED.moderator_id,
                reason = EXCLUDED.reason,
                source = EXCLUDED.source,
                created_at = now()
        "#,
    )
    .bind(guild_id)
    .bind(user_id)
    .bind(previous_roles)
    .bind(moderator_id)
    .bind(reason)
    .bind(source)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Option<QuarantineRow>, sqlx::Error> {
    sqlx::query_as::<_, QuarantineRow>(
        r#"
        SELECT guild_id, user_id, previous_roles, moderator_id, reason, source, created_at
        FROM quarantine
        WHERE guild_id = $1 AND user_id = $2
        "#,
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, guild_id: i64, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quarantine WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
