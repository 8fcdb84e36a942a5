use super::models::BlacklistRow;
use sqlx::PgPool;

pub async fn find(pool: &PgPool, user_id: i64) -> Result<Option<BlacklistRow>, sqlx::Error> {
    sqlx::query_as::<_, BlacklistRow>(
        "SELECT user_id, moderator_id, reason, created_at FROM blacklist WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn is_blacklisted(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
    Ok(find(pool, user_id).await?.is_some())
}

pub async fn insert(
    pool: &PgPool,
    user_id: i64,
    moderator_id: i64,
    reason: Option<&str>,
) -> Result<BlacklistRow, sqlx::Error> {
    sqlx::query_as::<_, BlacklistRow>(
        r#"
        INSERT INTO blacklist (user_id, moderator_id, reason)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET moderator_id = EXCLUDED.moderator_id,
                                            reason = EXCLUDED.reason
        RETURNING user_id, moderator_id, reason, created_at
        "#,
    )
    .bind(user_id)
    .bind(moderator_id)
    .bind(reason)
    .fetch_one(pool)
    .await
}

/// Removes a user from the blacklist. Returns the number of affected rows.
pub async fn delete(pool: &PgPool, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blacklist WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<BlacklistRow>, sqlx::Error> {
    sqlx::query_as::<_, BlacklistRow>(
        r#"
        SELECT user_id, moderator_id, reason, created_at
        FROM blacklist
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
