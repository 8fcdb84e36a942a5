use sqlx::PgPool;

pub async fn add(pool: &PgPool, guild_id: i64, role_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO autoroles (guild_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (guild_id, role_id) DO NOTHING
        "#,
    )
    .bind(guild_id)
    .bind(role_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove(pool: &PgPool, guild_id: i64, role_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM autoroles WHERE guild_id = $1 AND role_id = $2")
        .bind(guild_id)
        .bind(role_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn clear(pool: &PgPool, guild_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM autoroles WHERE guild_id = $1")
        .bind(guild_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list(pool: &PgPool, guild_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT role_id FROM autoroles WHERE guild_id = $1 ORDER BY role_id")
            .bind(guild_id)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
