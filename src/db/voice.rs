use super::models::{VoicemasterChannelRow, VoicemasterGuildRow};
use sqlx::PgPool;

pub async fn get_guild_config(
    pool: &PgPool,
    guild_id: i64,
) -> Result<Option<VoicemasterGuildRow>, sqlx::Error> {
    sqlx::query_as::<_, VoicemasterGuildRow>(
        "SELECT guild_id, category_id, generator_channel_id FROM voicemaster_guilds \
         WHERE guild_id = $1",
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await
}

pub async fn set_guild_config(
    pool: &PgPool,
    guild_id: i64,
    category_id: i64,
    generator_channel_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO voicemaster_guilds (guild_id, category_id, generator_channel_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (guild_id) DO UPDATE
            SET category_id = EXCLUDED.category_id,
                generator_channel_id = EXCLUDED.generator_channel_id
        "#,
    )
    .bind(guild_id)
    .bind(category_id)
    .bind(generator_channel_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_guild_config(pool: &PgPool, guild_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM voicemaster_guilds WHERE guild_id = $1")
        .bind(guild_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn insert_channel(
    pool: &PgPool,
    channel_id: i64,
    guild_id: i64,
    owner_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO voicemaster_channels (channel_id, guild_id, owner_id) VALUES ($1, $2, $3)",
    )
    .bind(channel_id)
    .bind(guild_id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_channel(
    pool: &PgPool,
    channel_id: i64,
) -> Result<Option<VoicemasterChannelRow>, sqlx::Error> {
    sqlx::query_as::<_, VoicemasterChannelRow>(
        "SELECT channel_id, guild_id, owner_id, created_at FROM voicemaster_channels \
         WHERE channel_id = $1",
    )
    .bind(channel_id)
    .fetch_optional(pool)
    .await
}

pub async fn set_owner(
    pool: &PgPool,
    channel_id: i64,
    owner_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE voicemaster_channels SET owner_id = $2 WHERE channel_id = $1")
        .bind(channel_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_channel(pool: &PgPool, channel_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM voicemaster_channels WHERE channel_id = $1")
        .bind(channel_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
