use super::models::GuildSettingsRow;
use sqlx::PgPool;

pub async fn get(pool: &PgPool, guild_id: i64) -> Result<Option<GuildSettingsRow>, sqlx::Error> {
    sqlx::query_as::<_, GuildSettingsRow>(
        "SELECT guild_id, prefix, mod_log_channel_id FROM guild_settings WHERE guild_id = $1",
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_prefix(pool: &PgPool, guild_id: i64) -> Result<Option<String>, sqlx::Error> {
    Ok(get(pool, guild_id).await?.and_then(|row| row.prefix))
}

pub async fn set_prefix(pool: &PgPool, guild_id: i64, prefix: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO guild_settings (guild_id, prefix)
        VALUES ($1, $2)
        ON CONFLICT (guild_id) DO UPDATE SET prefix = EXCLUDED.prefix
        "#,
    )
    .bind(guild_id)
    .bind(prefix)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear_prefix(pool: &PgPool, guild_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE guild_settings SET prefix = NULL WHERE guild_id = $1")
        .bind(guild_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_mod_log_channel(pool: &PgPool, guild_id: i64) -> Result<Option<i64>, sqlx::Error> {
    Ok(get(pool, guild_id).await?.and_then(|row| row.mod_log_channel_id))
}

pub async fn set_mod_log_channel(
    pool: &PgPool,
    guild_id: i64,
    channel_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO guild_settings (guild_id, mod_log_channel_id)
        VALUES ($1, $2)
        ON CONFLICT (guild_id) DO UPDATE SET mod_log_channel_id = EXCLUDED.mod_log_channel_id
        "#,
    )
    .bind(guild_id)
    .bind(channel_id)
    .execute(pool)
    .await?;

    Ok(())
}
