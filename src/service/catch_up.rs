//! Brings overdue ride events up to date.
//!
//! Every ride read or mutation first runs [`run`] inside its transaction:
//! upcoming events whose time has passed are marked done, and each one that
//! belongs to a recurring ride gets its successor materialized. The mark-done
//! write is the first statement of the transaction, so a concurrent catch-up
//! blocks on the sqlite write lock and afterwards no longer selects the
//! events this one completed.

use chrono::{DateTime, Utc, Weekday};
use log::{debug, error, info};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db;
use crate::errors::ApiError;
use crate::models::{RideEvent, RideSchedule, RideStatus, ScheduleUnit};
use crate::service::recurrence;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatchUpReport {
    pub completed: Vec<Uuid>,
    pub materialized: Vec<Uuid>,
}

pub async fn run(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<CatchUpReport, ApiError> {
    let completed = db::ride::mark_past_events_done(now, &mut *conn)
        .await
        .map_err(|err| {
            error!("catch-up: failed to mark past ride events as done: {:?}", err);
            ApiError::CatchUpFailed
        })?;

    let mut report = CatchUpReport {
        completed,
        materialized: Vec::new(),
    };
    if report.completed.is_empty() {
        return Ok(report);
    }
    debug!("catch-up: {} ride events completed", report.completed.len());

    for event_id in report.completed.clone() {
        let successor = materialize_successor(event_id, now, &mut *conn)
            .await
            .map_err(|err| {
                error!("catch-up: failed to materialize successor of event {}: {:?}", event_id, err);
                ApiError::CatchUpFailed
            })?;
        if let Some(successor) = successor {
            report.materialized.push(successor);
        }
    }

    Ok(report)
}

/// Inserts the next upcoming event of the ride `event_id` belongs to.
/// `None` when the ride has no schedule.
async fn materialize_successor(
    event_id: Uuid,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Uuid>, ApiError> {
    let event = match db::ride::get_event_row(event_id, &mut *conn).await? {
        Some(event) => event,
        None => return Err(ApiError::Internal),
    };
    let schedule = match db::ride::schedule::get(event.ride_id, &mut *conn).await? {
        Some(schedule) => schedule,
        None => return Ok(None),
    };

    let weekdays = load_weekdays(&schedule, &mut *conn).await?;
    let next = next_after(event.tacking_place_at, now, &schedule, weekdays.as_deref())?;
    let successor = RideEvent {
        id: Uuid::new_v4(),
        ride_id: event.ride_id,
        location_from: event.location_from,
        location_to: event.location_to,
        driver: event.driver,
        transport_limit: event.transport_limit,
        tacking_place_at: next,
        status: RideStatus::Upcoming,
    };
    db::ride::create_event(&successor, &mut *conn).await?;
    info!(
        "catch-up: ride {} next occurrence {} at {}",
        successor.ride_id,
        successor.id,
        successor.tacking_place_at.to_rfc3339()
    );
    Ok(Some(successor.id))
}

/// Weekday set of a `weekdays` schedule, `None` for every other unit.
pub async fn load_weekdays(
    schedule: &RideSchedule,
    conn: &mut SqliteConnection,
) -> Result<Option<Vec<Weekday>>, ApiError> {
    if schedule.unit != ScheduleUnit::Weekdays {
        return Ok(None);
    }
    let names = db::ride::schedule::get_weekdays(schedule.id, conn).await?;
    let days = names
        .iter()
        .map(|name| recurrence::parse_weekday(name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(days))
}

/// First occurrence of `schedule` strictly after `now`, stepping from
/// `scheduled_at`. Occurrences missed in between are skipped.
pub fn next_after(
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
    schedule: &RideSchedule,
    weekdays: Option<&[Weekday]>,
) -> Result<DateTime<Utc>, ApiError> {
    let mut next = recurrence::next_occurrence(scheduled_at, schedule.unit, schedule.schedule_interval, weekdays)?;
    while next <= now {
        next = recurrence::next_occurrence(next, schedule.unit, schedule.schedule_interval, weekdays)?;
    }
    Ok(next)
}
