use super::models::ReactionRoleRow;
use sqlx::PgPool;

pub async fn add(
    pool: &PgPool,
    guild_id: i64,
    message_id: i64,
    emoji: &str,
    role_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reaction_roles (guild_id, message_id, emoji, role_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (message_id, emoji) DO UPDATE SET role_id = EXCLUDED.role_id
        "#,
    )
    .bind(guild_id)
    .bind(message_id)
    .bind(emoji)
    .bind(role_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove(
    pool: &PgPool,
    message_id: i64,
    emoji: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reaction_roles WHERE message_id = $1 AND emoji = $2")
        .bind(message_id)
        .bind(emoji)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn find(
    pool: &PgPool,
    message_id: i64,
    emoji: &str,
) -> Result<Option<ReactionRoleRow>, sqlx::Error> {
    sqlx::query_as::<_, ReactionRoleRow>(
        "SELECT guild_id, message_id, emoji, role_id FROM reaction_roles \
         WHERE message_id = $1 AND emoji = $2",
    )
    .bind(message_id)
    .bind(emoji)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, guild_id: i64) -> Result<Vec<ReactionRoleRow>, sqlx::Error> {
    sqlx::query_as::<_, ReactionRoleRow>(
        "SELECT guild_id, message_id, emoji, role_id FROM reaction_roles \
         WHERE guild_id = $1 ORDER BY message_id",
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await
}

/// Clear bindings for one message, or every binding in the guild.
pub async fn clear(
    pool: &PgPool,
    guild_id: i64,
    message_id: Option<i64>,
) -> Result<u64, sqlx::Error> {
    let result = match message_id {
        Some(message_id) => {
            sqlx::query("DELETE FROM reaction_roles WHERE guild_id = $1 AND message_id = $2")
                .bind(guild_id)
                .bind(message_id)
                .execute(pool)
                .await?
        }
        None => {
            sqlx::query("DELETE FROM reaction_roles WHERE guild_id = $1")
                .bind(guild_id)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected())
}
