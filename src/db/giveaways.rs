use super::models::GiveawayRow;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const GIVEAWAY_COLUMNS: &str = "id, guild_id, channel_id, message_id, host_id, prize, winners, \
                                ends_at, ended, winner_ids, created_at";

pub async fn create(
    pool: &PgPool,
    guild_id: i64,
    channel_id: i64,
    message_id: i64,
    host_id: i64,
    prize: &str,
    winners: i64,
    ends_at: DateTime<Utc>,
) -> Result<GiveawayRow, sqlx::Error> {
    sqlx::query_as::<_, GiveawayRow>(&format!(
        r#"
        INSERT INTO giveaways (guild_id, channel_id, message_id, host_id, prize, winners, ends_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {GIVEAWAY_COLUMNS}
        "#
    ))
    .bind(guild_id)
    .bind(channel_id)
    .bind(message_id)
    .bind(host_id)
    .bind(prize)
    .bind(winners)
    .bind(ends_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_message(
    pool: &PgPool,
    guild_id: i64,
    message_id: i64,
) -> Result<Option<GiveawayRow>, sqlx::Error> {
    sqlx::query_as::<_, GiveawayRow>(&format!(
        "SELECT {GIVEAWAY_COLUMNS} FROM giveaways WHERE guild_id = $1 AND message_id = $2"
    ))
    .bind(guild_id)
    .bind(message_id)
    .fetch_optional(pool)
    .await
}

/// Giveaways whose deadline has passed and are still marked running.
pub async fn due(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<GiveawayRow>, sqlx::Error> {
    sqlx::query_as::<_, GiveawayRow>(&format!(
        "SELECT {GIVEAWAY_COLUMNS} FROM giveaways WHERE NOT ended AND ends_at <= $1"
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

pub async fn list_active(pool: &PgPool, guild_id: i64) -> Result<Vec<GiveawayRow>, sqlx::Error> {
    sqlx::query_as::<_, GiveawayRow>(&format!(
        "SELECT {GIVEAWAY_COLUMNS} FROM giveaways \
         WHERE guild_id = $1 AND NOT ended ORDER BY ends_at"
    ))
    .bind(guild_id)
    .fetch_all(pool)
    .await
}

pub async fn mark_ended(
    pool: &PgPool,
    id: i64,
    winner_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE giveaways SET ended = TRUE, winner_ids = $2 WHERE id = $1")
        .bind(id)
        .bind(winner_ids)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM giveaways WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Toggle a user's entry. Returns true if they are entered afterwards.
pub async fn toggle_entry(pool: &PgPool, giveaway_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO giveaway_entries (giveaway_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (giveaway_id, user_id) DO NOTHING
        "#,
    )
    .bind(giveaway_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        return Ok(true);
    }

    sqlx::query("DELETE FROM giveaway_entries WHERE giveaway_id = $1 AND user_id = $2")
        .bind(giveaway_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(false)
}

pub async fn entries(pool: &PgPool, giveaway_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT user_id FROM giveaway_entries WHERE giveaway_id = $1")
            .bind(giveaway_id)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
