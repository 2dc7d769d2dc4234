use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::Group;

pub async fn create<'e>(group: &Group, executor: impl SqliteExecutor<'e>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO ride_groups (id, name, description, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(group.id)
    .bind(&group.name)
    .bind(&group.description)
    .bind(&group.created_by)
    .bind(group.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_by_id<'e>(id: Uuid, executor: impl SqliteExecutor<'e>) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "SELECT id, name, description, created_by, created_at FROM ride_groups WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

// /groups/many
pub async fn get_many<'e>(offset: i64, limit: i64, executor: impl SqliteExecutor<'e>) -> Result<Vec<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "SELECT id, name, description, created_by, created_at FROM ride_groups
        ORDER BY created_at ASC, id ASC
        LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// `name` is kept when `None`. `description` is only touched when
/// `set_description` is true, and `None` then clears it.
pub async fn update<'e>(
    id: Uuid,
    name: Option<&str>,
    set_description: bool,
    description: Option<&str>,
    executor: impl SqliteExecutor<'e>,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE ride_groups
        SET name = COALESCE($1, name),
            description = CASE WHEN $2 THEN $3 ELSE description END
        WHERE id = $4",
    )
    .bind(name)
    .bind(set_description)
    .bind(description)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

pub mod members {
    use chrono::Utc;
    use sqlx::SqliteExecutor;
    use uuid::Uuid;

    use crate::models::{GroupMemberRow, JoinStatus};

    pub async fn get<'e>(group_id: Uuid, executor: impl SqliteExecutor<'e>) -> Result<Vec<GroupMemberRow>, sqlx::Error> {
        sqlx::query_as::<_, GroupMemberRow>(
            "SELECT m.user_id AS user_id, u.email AS email, m.join_status AS join_status
            FROM ride_group_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.group_id = $1
            ORDER BY m.joined_at ASC, m.user_id ASC",
        )
        .bind(group_id)
        .fetch_all(executor)
        .await
    }

    pub async fn get_status<'e>(
        group_id: Uuid,
        user_id: &str,
        executor: impl SqliteExecutor<'e>,
    ) -> Result<Option<JoinStatus>, sqlx::Error> {
        sqlx::query_scalar::<_, JoinStatus>(
            "SELECT join_status FROM ride_group_members WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Fails with a unique violation when the user already has a membership row.
    pub async fn join<'e>(
        group_id: Uuid,
        user_id: &str,
        status: JoinStatus,
        executor: impl SqliteExecutor<'e>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO ride_group_members (group_id, user_id, join_status, joined_at)
            VALUES ($1, $2, $3, $4)",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(status)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Deletes the membership unless it is a ban.
    pub async fn leave<'e>(group_id: Uuid, user_id: &str, executor: impl SqliteExecutor<'e>) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            "DELETE FROM ride_group_members
            WHERE group_id = $1 AND user_id = $2 AND join_status != $3",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(JoinStatus::Banned)
        .execute(executor)
        .await?;
        Ok(res.rows_affected())
    }

    /// Sets `to` only while the membership is still in `from`.
    pub async fn set_status<'e>(
        group_id: Uuid,
        user_id: &str,
        from: JoinStatus,
        to: JoinStatus,
        executor: impl SqliteExecutor<'e>,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(
            "UPDATE ride_group_members SET join_status = $1
            WHERE group_id = $2 AND user_id = $3 AND join_status = $4",
        )
        .bind(to)
        .bind(group_id)
        .bind(user_id)
        .bind(from)
        .execute(executor)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
