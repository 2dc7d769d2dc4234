use chrono::Utc;
use sqlx::SqliteExecutor;

use crate::models::User;

pub async fn create<'e>(
    id: &str,
    name: &str,
    email: &str,
    provider: &str,
    executor: impl SqliteExecutor<'e>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, name, email, provider, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, provider, access_token, refresh_token, is_blocked, created_at",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(provider)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(id: &str, executor: impl SqliteExecutor<'e>) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, provider, access_token, refresh_token, is_blocked, created_at
        FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn exists<'e>(id: &str, executor: impl SqliteExecutor<'e>) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(found > 0)
}

pub async fn set_blocked<'e>(id: &str, is_blocked: bool, executor: impl SqliteExecutor<'e>) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET is_blocked = $1 WHERE id = $2")
        .bind(is_blocked)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn update_name_and_email<'e>(
    id: &str,
    name: &str,
    email: &str,
    executor: impl SqliteExecutor<'e>,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3")
        .bind(name)
        .bind(email)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_tokens<'e>(
    id: &str,
    access_token: &str,
    refresh_token: &str,
    executor: impl SqliteExecutor<'e>,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET access_token = $1, refresh_token = $2 WHERE id = $3")
        .bind(access_token)
        .bind(refresh_token)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

/// Replaces the token pair only while `expected_refresh` is still the stored
/// refresh token. Returns `false` when another refresh won the race.
pub async fn rotate_tokens<'e>(
    id: &str,
    expected_refresh: &str,
    access_token: &str,
    refresh_token: &str,
    executor: impl SqliteExecutor<'e>,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE users SET access_token = $1, refresh_token = $2
        WHERE id = $3 AND refresh_token = $4",
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(id)
    .bind(expected_refresh)
    .execute(executor)
    .await?;
    Ok(res.rows_affected() == 1)
}
