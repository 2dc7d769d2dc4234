use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{Ride, RideEvent, RideRow, RideSchedule, RideStatus, ScheduleUnit};

const RIDE_ROW_SELECT: &str = "
SELECT
    r.id AS ride_id,
    e.id AS ride_event_id,
    e.location_from AS location_from,
    e.location_to AS location_to,
    e.tacking_place_at AS tacking_place_at,
    e.status AS status,
    r.created_by AS created_by,
    cu.email AS created_by_email,
    e.driver AS driver,
    du.email AS driver_email,
    e.transport_limit AS transport_limit,
    s.id AS ride_schedule_id,
    s.unit AS ride_schedule_unit,
    s.schedule_interval AS ride_schedule_interval
FROM ride_events e
JOIN rides r ON r.id = e.ride_id
JOIN users cu ON cu.id = r.created_by
JOIN users du ON du.id = e.driver
LEFT JOIN ride_schedules s ON s.ride_id = r.id";

const LATEST_EVENT_OF_RIDE: &str = "e.id = (
    SELECT latest.id FROM ride_events latest
    WHERE latest.ride_id = r.id
    ORDER BY latest.tacking_place_at DESC
    LIMIT 1
)";

pub async fn create(ride: &Ride, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO rides (id, location_from, location_to, driver, created_by, transport_limit, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(ride.id)
    .bind(&ride.location_from)
    .bind(&ride.location_to)
    .bind(&ride.driver)
    .bind(&ride.created_by)
    .bind(ride.transport_limit)
    .bind(ride.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn create_event(event: &RideEvent, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO ride_events (id, ride_id, location_from, location_to, driver, transport_limit, tacking_place_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(event.id)
    .bind(event.ride_id)
    .bind(&event.location_from)
    .bind(&event.location_to)
    .bind(&event.driver)
    .bind(event.transport_limit)
    .bind(event.tacking_place_at)
    .bind(event.status)
    .execute(conn)
    .await?;
    Ok(())
}

/// Marks every upcoming event scheduled at or before `now` as done and
/// returns their ids. Runs as a single write statement.
pub async fn mark_past_events_done(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "UPDATE ride_events SET status = $1
        WHERE status = $2 AND tacking_place_at <= $3
        RETURNING id",
    )
    .bind(RideStatus::Done)
    .bind(RideStatus::Upcoming)
    .bind(now)
    .fetch_all(conn)
    .await
}

pub async fn get_event_row(id: Uuid, conn: &mut SqliteConnection) -> Result<Option<RideEvent>, sqlx::Error> {
    sqlx::query_as::<_, RideEvent>(
        "SELECT id, ride_id, location_from, location_to, driver, transport_limit, tacking_place_at, status
        FROM ride_events WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

// /rides/by-id/{id}
pub async fn get_event(id: Uuid, conn: &mut SqliteConnection) -> Result<Option<RideRow>, sqlx::Error> {
    let sql = format!("{RIDE_ROW_SELECT} WHERE e.id = $1");
    sqlx::query_as::<_, RideRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

// /rides/upcoming/by-id/{id}
pub async fn get_latest(ride_id: Uuid, conn: &mut SqliteConnection) -> Result<Option<RideRow>, sqlx::Error> {
    let sql = format!("{RIDE_ROW_SELECT} WHERE r.id = $1 AND {LATEST_EVENT_OF_RIDE}");
    sqlx::query_as::<_, RideRow>(&sql)
        .bind(ride_id)
        .fetch_optional(conn)
        .await
}

/// One page of rides, each represented by its latest event, soonest first.
pub async fn get_many(offset: i64, limit: i64, conn: &mut SqliteConnection) -> Result<Vec<RideRow>, sqlx::Error> {
    let sql = format!(
        "{RIDE_ROW_SELECT} WHERE {LATEST_EVENT_OF_RIDE}
        ORDER BY e.tacking_place_at ASC, r.id ASC
        LIMIT $1 OFFSET $2"
    );
    sqlx::query_as::<_, RideRow>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await
}

pub async fn update_event_status(
    id: Uuid,
    status: RideStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE ride_events SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub mod schedule {
    use sqlx::SqliteConnection;
    use uuid::Uuid;

    use super::{RideSchedule, ScheduleUnit};

    pub async fn get(ride_id: Uuid, conn: &mut SqliteConnection) -> Result<Option<RideSchedule>, sqlx::Error> {
        sqlx::query_as::<_, RideSchedule>(
            "SELECT id, ride_id, schedule_interval, unit FROM ride_schedules WHERE ride_id = $1",
        )
        .bind(ride_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn get_weekdays(schedule_id: Uuid, conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT weekday FROM ride_schedule_weekdays WHERE ride_schedule_id = $1",
        )
        .bind(schedule_id)
        .fetch_all(conn)
        .await
    }

    pub async fn create(
        ride_id: Uuid,
        interval: i64,
        unit: ScheduleUnit,
        conn: &mut SqliteConnection,
    ) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO ride_schedules (id, ride_id, schedule_interval, unit) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(ride_id)
        .bind(interval)
        .bind(unit)
        .execute(conn)
        .await?;
        Ok(id)
    }

    pub async fn create_weekday(schedule_id: Uuid, weekday: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO ride_schedule_weekdays (ride_schedule_id, weekday) VALUES ($1, $2)")
            .bind(schedule_id)
            .bind(weekday)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn drop_weekdays(schedule_id: Uuid, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM ride_schedule_weekdays WHERE ride_schedule_id = $1")
            .bind(schedule_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn drop(ride_id: Uuid, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM ride_schedules WHERE ride_id = $1")
            .bind(ride_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}
