use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Group, GroupMemberRow, JoinStatus, RideRow, RideStatus, ScheduleUnit};

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub unit: String,
    pub interval: Option<i64>,
    pub weekdays: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewRideDto {
    pub location_from: String,
    pub location_to: String,
    pub tacking_place_at: DateTime<Utc>,
    pub driver: String,
    pub transport_limit: i64,
    pub schedule: Option<ScheduleDto>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRideDto {
    pub ride_event_id: Uuid,
    pub schedule: Option<ScheduleDto>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<String>,
}

impl PageQuery {
    /// Anything that is not a positive integer reads as the first page.
    pub fn offset(&self) -> i64 {
        self.offset
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|offset| *offset > 0)
            .unwrap_or(0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideScheduleData {
    pub unit: String,
    pub interval: i64,
    pub weekdays: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideEventData {
    pub ride_id: Uuid,
    pub ride_event_id: Uuid,
    pub location_from: String,
    pub location_to: String,
    pub tacking_place_at: DateTime<Utc>,
    pub status: RideStatus,
    pub created_by: String,
    pub created_by_email: String,
    pub driver_id: String,
    pub driver_email: String,
    pub transport_limit: i64,
    pub schedule: Option<RideScheduleData>,
}

impl RideEventData {
    pub fn from_row(row: RideRow, weekdays: Option<Vec<String>>) -> Self {
        let schedule = match (row.ride_schedule_id, row.ride_schedule_unit) {
            (Some(_), Some(unit)) => Some(RideScheduleData {
                unit: unit.as_str().to_string(),
                interval: row.ride_schedule_interval.unwrap_or_default(),
                weekdays: match unit {
                    ScheduleUnit::Weekdays => weekdays,
                    _ => None,
                },
            }),
            _ => None,
        };
        RideEventData {
            ride_id: row.ride_id,
            ride_event_id: row.ride_event_id,
            location_from: row.location_from,
            location_to: row.location_to,
            tacking_place_at: row.tacking_place_at,
            status: row.status,
            created_by: row.created_by,
            created_by_email: row.created_by_email,
            driver_id: row.driver,
            driver_email: row.driver_email,
            transport_limit: row.transport_limit,
            schedule,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewGroupDto {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupDto {
    pub group_id: Uuid,
    pub name: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberStatusDto {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberData {
    pub user_id: String,
    pub email: String,
    pub join_status: JoinStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupData {
    pub group_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub members: Vec<GroupMemberData>,
}

impl GroupData {
    pub fn new(group: Group, members: Vec<GroupMemberRow>) -> Self {
        GroupData {
            group_id: group.id,
            name: group.name,
            description: group.description,
            created_by: group.created_by,
            members: members
                .into_iter()
                .map(|member| GroupMemberData {
                    user_id: member.user_id,
                    email: member.email,
                    join_status: member.join_status,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BanStatusDto {
    pub is_banned: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokensDto {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub random: String,
    pub exp: i64,
}

impl Claims {
    pub fn new(id: &str, email: &str, exp: i64) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            random: Uuid::new_v4().to_string(),
            exp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// Profile returned by the identity provider after the code exchange.
#[derive(Debug, Deserialize, Clone)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    pub verified_email: bool,
    pub name: String,
}

