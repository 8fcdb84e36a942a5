use super::models::CaseRow;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const CASE_COLUMNS: &str = "guild_id, case_id, moderator_id, target_id, kind, reason, \
                            duration_secs, expires_at, edited_by, edited_at, created_at";

/// Insert a new case with the next per-guild case number and return it.
pub async fn create(
    pool: &PgPool,
    guild_id: i64,
    moderator_id: i64,
    target_id: i64,
    kind: &str,
    reason: Option<&str>,
    duration_secs: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error> {
    let (case_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO cases (guild_id, case_id, moderator_id, target_id, kind, reason,
                           duration_secs, expires_at)
        VALUES ($1,
                COALESCE((SELECT MAX(case_id) FROM cases WHERE guild_id = $1), 0) + 1,
                $2, $3, $4, $5, $6, $7)
        RETURNING case_id
        "#,
    )
    .bind(guild_id)
    .bind(moderator_id)
    .bind(target_id)
    .bind(kind)
    .bind(reason)
    .bind(duration_secs)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(case_id)
}

pub async fn get(
    pool: &PgPool,
    guild_id: i64,
    case_id: i64,
) -> Result<Option<CaseRow>, sqlx::Error> {
    sqlx::query_as::<_, CaseRow>(&format!(
        "SELECT {CASE_COLUMNS} FROM cases WHERE guild_id = $1 AND case_id = $2"
    ))
    .bind(guild_id)
    .bind(case_id)
    .fetch_optional(pool)
    .await
}

/// Replace a case's reason, recording who edited it and when.
pub async fn edit_reason(
    pool: &PgPool,
    guild_id: i64,
    case_id: i64,
    reason: &str,
    edited_by: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE cases
        SET reason = $3, edited_by = $4, edited_at = now()
        WHERE guild_id = $1 AND case_id = $2
        "#,
    )
    .bind(guild_id)
    .bind(case_id)
    .bind(reason)
    .bind(edited_by)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, guild_id: i64, case_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cases WHERE guild_id = $1 AND case_id = $2")
        .bind(guild_id)
        .bind(case_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list_for_target(
    pool: &PgPool,
    guild_id: i64,
    target_id: i64,
    kind: Option<&str>,
) -> Result<Vec<CaseRow>, sqlx::Error> {
    match kind {
        Some(kind) => {
            sqlx::query_as::<_, CaseRow>(&format!(
                "SELECT {CASE_COLUMNS} FROM cases \
                 WHERE guild_id = $1 AND target_id = $2 AND kind = $3 \
                 ORDER BY case_id DESC"
            ))
            .bind(guild_id)
            .bind(target_id)
            .bind(kind)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, CaseRow>(&format!(
                "SELECT {CASE_COLUMNS} FROM cases \
                 WHERE guild_id = $1 AND target_id = $2 \
                 ORDER BY case_id DESC"
            ))
            .bind(guild_id)
            .bind(target_id)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn list_recent(
    pool: &PgPool,
    guild_id: i64,
    limit: i64,
) -> Result<Vec<CaseRow>, sqlx::Error> {
    sqlx::query_as::<_, CaseRow>(&format!(
        "SELECT {CASE_COLUMNS} FROM cases WHERE guild_id = $1 ORDER BY case_id DESC LIMIT $2"
    ))
    .bind(guild_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Delete every case against a target, optionally restricted to one kind.
/// Returns the number of removed cases.
pub async fn clear_for_target(
    pool: &PgPool,
    guild_id: i64,
    target_id: i64,
    kind: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = match kind {
        Some(kind) => {
            sqlx::query("DELETE FROM cases WHERE guild_id = $1 AND target_id = $2 AND kind = $3")
                .bind(guild_id)
                .bind(target_id)
                .bind(kind)
                .execute(pool)
                .await?
        }
        None => {
            sqlx::query("DELETE FROM cases WHERE guild_id = $1 AND target_id = $2")
                .bind(guild_id)
                .bind(target_id)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected())
}

/// Per-kind case counts for a target, e.g. for the `history` summary.
pub async fn counts_by_kind(
    pool: &PgPool,
    guild_id: i64,
    target_id: i64,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT kind, COUNT(*)
        FROM cases
        WHERE guild_id = $1 AND target_id = $2
        GROUP BY kind
        ORDER BY COUNT(*) DESC
        "#,
    )
    .bind(guild_id)
    .bind(target_id)
    .fetch_all(pool)
    .await
}
