use chrono::{DateTime, SubsecRound, Utc, Weekday};
use log::{debug, info};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db;
use crate::dto::{NewRideDto, RideEventData, ScheduleDto, UpdateRideDto};
use crate::errors::ApiError;
use crate::models::{Ride, RideEvent, RideRow, RideStatus, ScheduleUnit, User};
use crate::service::{catch_up, recurrence};
use crate::DbPool;

/// A schedule that passed validation: known unit, positive interval for the
/// fixed units, and a non-empty, de-duplicated weekday set for `weekdays`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSchedule {
    pub unit: ScheduleUnit,
    pub interval: i64,
    pub weekdays: Vec<Weekday>,
}

impl TryFrom<&ScheduleDto> for ValidSchedule {
    type Error = ApiError;

    fn try_from(dto: &ScheduleDto) -> Result<Self, Self::Error> {
        let unit: ScheduleUnit = dto.unit.parse()?;
        if unit == ScheduleUnit::Weekdays {
            let names = match &dto.weekdays {
                Some(names) if !names.is_empty() => names,
                _ => {
                    return Err(ApiError::Validation(
                        "Invalid schedule. Field 'unit' is 'weekdays' but the field 'weekdays' is empty or undefined."
                            .to_string(),
                    ))
                }
            };
            let mut weekdays = names
                .iter()
                .map(|name| recurrence::parse_weekday(name))
                .collect::<Result<Vec<_>, _>>()?;
            weekdays.sort_by_key(|day| day.num_days_from_sunday());
            weekdays.dedup();
            return Ok(ValidSchedule {
                unit,
                interval: dto.interval.unwrap_or(1),
                weekdays,
            });
        }

        match dto.interval {
            Some(interval) if interval >= 1 => Ok(ValidSchedule {
                unit,
                interval,
                weekdays: Vec::new(),
            }),
            Some(interval) => Err(ApiError::InvalidSchedule(format!(
                "Field 'interval' must be a positive integer, received {interval}."
            ))),
            None => Err(ApiError::Validation(format!(
                "Field 'interval' is required for unit '{}'.",
                unit.as_str()
            ))),
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("Field '{field}' must not be empty.")));
    }
    Ok(())
}

/// Ride lifecycle over the shared store. Every read and update first runs
/// the catch-up inside its own transaction.
#[derive(Clone)]
pub struct RideService {
    pool: DbPool,
    page_size: i64,
}

impl RideService {
    pub fn new(pool: DbPool, page_size: i64) -> Self {
        Self { pool, page_size }
    }

    pub async fn create(&self, owner: &User, dto: NewRideDto, now: DateTime<Utc>) -> Result<RideEventData, ApiError> {
        require_text("locationFrom", &dto.location_from)?;
        require_text("locationTo", &dto.location_to)?;
        require_text("driver", &dto.driver)?;
        if dto.transport_limit < 1 {
            return Err(ApiError::Validation(
                "Field 'transportLimit' must be a positive integer.".to_string(),
            ));
        }
        let schedule = dto.schedule.as_ref().map(ValidSchedule::try_from).transpose()?;

        // first statement must be a write so busy_timeout applies
        let mut tx = self.pool.begin().await?;
        catch_up::run(now, &mut *tx).await?;
        if !db::user::exists(&dto.driver, &mut *tx).await? {
            return Err(ApiError::Validation(format!(
                "Field 'driver' references unknown user '{}'.",
                dto.driver
            )));
        }

        let ride = Ride {
            id: Uuid::new_v4(),
            location_from: dto.location_from,
            location_to: dto.location_to,
            driver: dto.driver,
            created_by: owner.id.clone(),
            transport_limit: dto.transport_limit,
            created_at: Utc::now().trunc_subsecs(0),
        };
        db::ride::create(&ride, &mut *tx).await?;

        let event = RideEvent {
            id: Uuid::new_v4(),
            ride_id: ride.id,
            location_from: ride.location_from.clone(),
            location_to: ride.location_to.clone(),
            driver: ride.driver.clone(),
            transport_limit: ride.transport_limit,
            tacking_place_at: dto.tacking_place_at.trunc_subsecs(0),
            status: RideStatus::Upcoming,
        };
        db::ride::create_event(&event, &mut *tx).await?;

        if let Some(schedule) = &schedule {
            insert_schedule(ride.id, schedule, &mut *tx).await?;
        }

        let row = match db::ride::get_latest(ride.id, &mut *tx).await? {
            Some(row) => row,
            None => return Err(ApiError::Internal),
        };
        let created = to_event_data(row, &mut *tx).await?;
        tx.commit().await?;

        info!("ride {} created by {}", ride.id, owner.id);
        Ok(created)
    }

    pub async fn update(&self, actor: &User, dto: UpdateRideDto, now: DateTime<Utc>) -> Result<(), ApiError> {
        let schedule = dto.schedule.as_ref().map(ValidSchedule::try_from).transpose()?;
        let status = dto.status.as_deref().map(str::parse::<RideStatus>).transpose()?;

        let mut tx = self.pool.begin().await?;
        catch_up::run(now, &mut *tx).await?;

        let event = match db::ride::get_event(dto.ride_event_id, &mut *tx).await? {
            Some(event) => event,
            None => return Err(ApiError::not_found("No ride event exists for the event with 'id'.")),
        };
        if event.created_by != actor.id {
            return Err(ApiError::Forbidden(
                "You are not the owner of this ride event.".to_string(),
            ));
        }

        let status = match status {
            Some(to) if to == event.status => None,
            Some(to) if RideStatus::owner_can_set(event.status, to) => Some(to),
            Some(to) => {
                return Err(ApiError::InvalidStatusTransition {
                    from: event.status,
                    to,
                })
            }
            None => None,
        };

        if let Some(schedule) = &schedule {
            if let Some(existing) = db::ride::schedule::get(event.ride_id, &mut *tx).await? {
                db::ride::schedule::drop_weekdays(existing.id, &mut *tx).await?;
            }
            db::ride::schedule::drop(event.ride_id, &mut *tx).await?;
            insert_schedule(event.ride_id, schedule, &mut *tx).await?;
            debug!("ride {} schedule replaced with {:?}", event.ride_id, schedule.unit);
        }

        if let Some(status) = status {
            db::ride::update_event_status(event.ride_event_id, status, &mut *tx).await?;
            debug!("ride event {} set to {}", event.ride_event_id, status.as_str());
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<RideEventData, ApiError> {
        let mut tx = self.pool.begin().await?;
        catch_up::run(now, &mut *tx).await?;

        let row = match db::ride::get_event(event_id, &mut *tx).await? {
            Some(row) => row,
            None => return Err(ApiError::not_found("No ride event exists for the event with 'id'.")),
        };
        let ride = to_event_data(row, &mut *tx).await?;
        tx.commit().await?;
        Ok(ride)
    }

    /// Latest occurrence of the ride, unless the ride has ended: its latest
    /// event is no longer upcoming and there is no schedule to continue it.
    pub async fn get_upcoming_by_id(&self, ride_id: Uuid, now: DateTime<Utc>) -> Result<RideEventData, ApiError> {
        let mut tx = self.pool.begin().await?;
        catch_up::run(now, &mut *tx).await?;

        let row = match db::ride::get_latest(ride_id, &mut *tx).await? {
            Some(row) if row.status == RideStatus::Upcoming || row.ride_schedule_id.is_some() => row,
            _ => return Err(ApiError::not_found("No next ride exists for the ride with 'id'.")),
        };
        let ride = to_event_data(row, &mut *tx).await?;
        tx.commit().await?;
        Ok(ride)
    }

    pub async fn list(&self, offset: i64, now: DateTime<Utc>) -> Result<Vec<RideEventData>, ApiError> {
        let mut tx = self.pool.begin().await?;
        catch_up::run(now, &mut *tx).await?;

        let rows = db::ride::get_many(offset, self.page_size, &mut *tx).await?;
        let mut rides = Vec::with_capacity(rows.len());
        for row in rows {
            rides.push(to_event_data(row, &mut *tx).await?);
        }
        tx.commit().await?;
        Ok(rides)
    }
}

async fn insert_schedule(ride_id: Uuid, schedule: &ValidSchedule, conn: &mut SqliteConnection) -> Result<(), ApiError> {
    let schedule_id = db::ride::schedule::create(ride_id, schedule.interval, schedule.unit, &mut *conn).await?;
    for day in &schedule.weekdays {
        db::ride::schedule::create_weekday(schedule_id, recurrence::weekday_name(*day), &mut *conn).await?;
    }
    Ok(())
}

async fn to_event_data(row: RideRow, conn: &mut SqliteConnection) -> Result<RideEventData, ApiError> {
    let weekdays = match (row.ride_schedule_id, row.ride_schedule_unit) {
        (Some(schedule_id), Some(ScheduleUnit::Weekdays)) => {
            let mut days = db::ride::schedule::get_weekdays(schedule_id, conn)
                .await?
                .iter()
                .map(|name| recurrence::parse_weekday(name))
                .collect::<Result<Vec<_>, _>>()?;
            days.sort_by_key(|day| day.num_days_from_sunday());
            Some(days.into_iter().map(|day| recurrence::weekday_name(day).to_string()).collect())
        }
        _ => None,
    };
    Ok(RideEventData::from_row(row, weekdays))
}
