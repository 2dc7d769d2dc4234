use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::errors::ApiError;

pub const AUTH_PROVIDER_GOOGLE: &str = "google";

#[derive(Debug, Clone, FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub provider: String,
    #[serde(skip)]
    pub access_token: Option<String>,
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// The template a ride's occurrences are generated from.
#[derive(Debug, Clone, FromRow)]
pub struct Ride {
    pub id: Uuid,
    pub location_from: String,
    pub location_to: String,
    pub driver: String,
    pub created_by: String,
    pub transport_limit: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Upcoming,
    Done,
    Canceled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Upcoming => "upcoming",
            RideStatus::Done => "done",
            RideStatus::Canceled => "canceled",
        }
    }

    /// Only `upcoming` may move, and only forward. `done` and `canceled` are terminal.
    pub fn can_transition(from: RideStatus, to: RideStatus) -> bool {
        matches!(
            (from, to),
            (RideStatus::Upcoming, RideStatus::Done) | (RideStatus::Upcoming, RideStatus::Canceled)
        )
    }

    /// `done` is reached only through the catch-up once the event's time has
    /// passed, so an owner can only cancel.
    pub fn owner_can_set(from: RideStatus, to: RideStatus) -> bool {
        to != RideStatus::Done && RideStatus::can_transition(from, to)
    }
}

impl FromStr for RideStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(RideStatus::Upcoming),
            "done" => Ok(RideStatus::Done),
            "canceled" => Ok(RideStatus::Canceled),
            other => Err(ApiError::Validation(format!(
                "invalid status '{other}', expected one of 'upcoming', 'done', 'canceled'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleUnit {
    Days,
    Weeks,
    Months,
    Years,
    Weekdays,
}

impl ScheduleUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleUnit::Days => "days",
            ScheduleUnit::Weeks => "weeks",
            ScheduleUnit::Months => "months",
            ScheduleUnit::Years => "years",
            ScheduleUnit::Weekdays => "weekdays",
        }
    }
}

impl FromStr for ScheduleUnit {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(ScheduleUnit::Days),
            "weeks" => Ok(ScheduleUnit::Weeks),
            "months" => Ok(ScheduleUnit::Months),
            "years" => Ok(ScheduleUnit::Years),
            "weekdays" => Ok(ScheduleUnit::Weekdays),
            other => Err(ApiError::InvalidScheduleUnit(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RideSchedule {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub schedule_interval: i64,
    pub unit: ScheduleUnit,
}

/// One occurrence of a ride. Route, driver and capacity are copied from the
/// ride when the occurrence is materialized.
#[derive(Debug, Clone, FromRow)]
pub struct RideEvent {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub location_from: String,
    pub location_to: String,
    pub driver: String,
    pub transport_limit: i64,
    pub tacking_place_at: DateTime<Utc>,
    pub status: RideStatus,
}

/// A ride event joined with its ride, the emails of driver and creator, and
/// the ride's schedule when there is one.
#[derive(Debug, Clone, FromRow)]
pub struct RideRow {
    pub ride_id: Uuid,
    pub ride_event_id: Uuid,
    pub location_from: String,
    pub location_to: String,
    pub tacking_place_at: DateTime<Utc>,
    pub status: RideStatus,
    pub created_by: String,
    pub created_by_email: String,
    pub driver: String,
    pub driver_email: String,
    pub transport_limit: i64,
    pub ride_schedule_id: Option<Uuid>,
    pub ride_schedule_unit: Option<ScheduleUnit>,
    pub ride_schedule_interval: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    Pending,
    Member,
    Banned,
}

impl JoinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStatus::Pending => "pending",
            JoinStatus::Member => "member",
            JoinStatus::Banned => "banned",
        }
    }

    /// Moves the group owner may make on someone else's membership.
    pub fn owner_can_set(from: JoinStatus, to: JoinStatus) -> bool {
        matches!(
            (from, to),
            (JoinStatus::Pending, JoinStatus::Member)
                | (JoinStatus::Banned, JoinStatus::Member)
                | (JoinStatus::Pending, JoinStatus::Banned)
                | (JoinStatus::Member, JoinStatus::Banned)
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberRow {
    pub user_id: String,
    pub email: String,
    pub join_status: JoinStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward_from_upcoming() {
        use RideStatus::*;
        assert!(RideStatus::can_transition(Upcoming, Done));
        assert!(RideStatus::can_transition(Upcoming, Canceled));

        for to in [Upcoming, Done, Canceled] {
            assert!(!RideStatus::can_transition(Done, to));
            assert!(!RideStatus::can_transition(Canceled, to));
        }
        assert!(!RideStatus::can_transition(Upcoming, Upcoming));
    }

    #[test]
    fn owner_may_only_cancel() {
        use RideStatus::*;
        assert!(RideStatus::owner_can_set(Upcoming, Canceled));
        assert!(!RideStatus::owner_can_set(Upcoming, Done));
        assert!(!RideStatus::owner_can_set(Canceled, Upcoming));
    }

    #[test]
    fn membership_moves() {
        use JoinStatus::*;
        assert!(JoinStatus::owner_can_set(Pending, Member));
        assert!(JoinStatus::owner_can_set(Member, Banned));
        assert!(JoinStatus::owner_can_set(Banned, Member));
        assert!(!JoinStatus::owner_can_set(Member, Member));
        assert!(!JoinStatus::owner_can_set(Banned, Banned));
        assert!(!JoinStatus::owner_can_set(Member, Pending));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert_eq!("weeks".parse::<ScheduleUnit>().unwrap(), ScheduleUnit::Weeks);
        assert!(matches!(
            "fortnights".parse::<ScheduleUnit>(),
            Err(ApiError::InvalidScheduleUnit(unit)) if unit == "fortnights"
        ));
        assert!("Days".parse::<ScheduleUnit>().is_err());
    }

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!("canceled".parse::<RideStatus>().unwrap(), RideStatus::Canceled);
        assert!("cancelled".parse::<RideStatus>().is_err());
    }
}
