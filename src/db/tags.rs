use super::models::TagRow;
use sqlx::PgPool;

const TAG_COLUMNS: &str = "guild_id, name, content, owner_id, uses, created_at";

/// Tag names are stored and looked up lowercased.
pub async fn find(pool: &PgPool, guild_id: i64, name: &str) -> Result<Option<TagRow>, sqlx::Error> {
    sqlx::query_as::<_, TagRow>(&format!(
        "SELECT {TAG_COLUMNS} FROM tags WHERE guild_id = $1 AND name = $2"
    ))
    .bind(guild_id)
    .bind(name.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Returns false if the name is already taken.
pub async fn create(
    pool: &PgPool,
    guild_id: i64,
    name: &str,
    content: &str,
    owner_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO tags (guild_id, name, content, owner_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (guild_id, name) DO NOTHING
        "#,
    )
    .bind(guild_id)
    .bind(name.to_lowercase())
    .bind(content)
    .bind(owner_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_content(
    pool: &PgPool,
    guild_id: i64,
    name: &str,
    content: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE tags SET content = $3 WHERE guild_id = $1 AND name = $2")
        .bind(guild_id)
        .bind(name.to_lowercase())
        .bind(content)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn set_owner(
    pool: &PgPool,
    guild_id: i64,
    name: &str,
    owner_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE tags SET owner_id = $3 WHERE guild_id = $1 AND name = $2")
        .bind(guild_id)
        .bind(name.to_lowercase())
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, guild_id: i64, name: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tags WHERE guild_id = $1 AND name = $2")
        .bind(guild_id)
        .bind(name.to_lowercase())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn bump_uses(pool: &PgPool, guild_id: i64, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tags SET uses = uses + 1 WHERE guild_id = $1 AND name = $2")
        .bind(guild_id)
        .bind(name.to_lowercase())
        .execute(pool)
        .await?;

    Ok(())
}

/// All tags in a guild, optionally restricted to one owner.
pub async fn list(
    pool: &PgPool,
    guild_id: i64,
    owner_id: Option<i64>,
) -> Result<Vec<TagRow>, sqlx::Error> {
    match owner_id {
        Some(owner_id) => {
            sqlx::query_as::<_, TagRow>(&format!(
                "SELECT {TAG_COLUMNS} FROM tags WHERE guild_id = $1 AND owner_id = $2 ORDER BY name"
            ))
            .bind(guild_id)
            .bind(owner_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, TagRow>(&format!(
                "SELECT {TAG_COLUMNS} FROM tags WHERE guild_id = $1 ORDER BY name"
            ))
            .bind(guild_id)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn search(
    pool: &PgPool,
    guild_id: i64,
    query: &str,
    limit: i64,
) -> Result<Vec<TagRow>, sqlx::Error> {
    sqlx::query_as::<_, TagRow>(&format!(
        "SELECT {TAG_COLUMNS} FROM tags WHERE guild_id = $1 AND name LIKE $2 ORDER BY name LIMIT $3"
    ))
    .bind(guild_id)
    .bind(format!("%{}%", query.to_lowercase()))
    .bind(limit)
    .fetch_all(pool)
    .await
}
