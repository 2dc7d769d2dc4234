use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::{Display, Error};
use log::error;
use serde::Serialize;

use crate::models::RideStatus;

#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display(fmt = "Missing/Invalid fields in request body.")]
    Validation(#[error(not(source))] String),

    #[display(fmt = "Invalid JSON in request body.")]
    InvalidJson(#[error(not(source))] String),

    #[display(fmt = "{}", _0)]
    BadRequest(#[error(not(source))] String),

    #[display(fmt = "{}", _0)]
    NotFound(#[error(not(source))] String),

    #[display(fmt = "{}", _0)]
    Forbidden(#[error(not(source))] String),

    #[display(fmt = "{}", _0)]
    Unauthorized(#[error(not(source))] String),

    #[display(fmt = "{}", _0)]
    Conflict(#[error(not(source))] String),

    #[display(fmt = "Invalid schedule unit.")]
    InvalidScheduleUnit(#[error(not(source))] String),

    #[display(fmt = "Invalid schedule weekday.")]
    InvalidWeekday(#[error(not(source))] String),

    #[display(fmt = "Invalid schedule.")]
    InvalidSchedule(#[error(not(source))] String),

    #[display(fmt = "Invalid ride status transition.")]
    InvalidStatusTransition { from: RideStatus, to: RideStatus },

    #[display(fmt = "Failed to update rides.")]
    CatchUpFailed,

    #[display(fmt = "internal error")]
    Database,

    #[display(fmt = "internal error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct RestErrors {
    pub errors: Vec<RestError>,
}

#[derive(Debug, Serialize)]
pub struct RestError {
    pub title: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn not_found(title: &str) -> Self {
        ApiError::NotFound(title.to_string())
    }

    pub fn unauthorized(title: &str) -> Self {
        ApiError::Unauthorized(title.to_string())
    }

    pub fn bad_request(title: &str) -> Self {
        ApiError::BadRequest(title.to_string())
    }

    pub fn forbidden(title: &str) -> Self {
        ApiError::Forbidden(title.to_string())
    }

    pub fn conflict(title: &str) -> Self {
        ApiError::Conflict(title.to_string())
    }

    /// Human readable detail for the client. Never set for 5xx.
    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::Validation(detail) | ApiError::InvalidJson(detail) | ApiError::InvalidSchedule(detail) => {
                Some(detail.clone())
            }
            ApiError::InvalidScheduleUnit(unit) => Some(format!(
                "Unknown unit '{unit}'. Allowed units are 'days', 'weeks', 'months', 'years', 'weekdays'."
            )),
            ApiError::InvalidWeekday(day) => Some(format!(
                "Unknown weekday '{day}'. Only lowercase standard english weekday names are allowed."
            )),
            ApiError::InvalidStatusTransition { from, to } => Some(format!(
                "A ride event cannot go from '{}' to '{}'.",
                from.as_str(),
                to.as_str()
            )),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!("database error: {:?}", err);
        ApiError::Database
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let body = RestErrors {
            errors: vec![RestError {
                title: self.to_string(),
                details: self.details(),
            }],
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::Validation(_)
            | ApiError::InvalidJson(_)
            | ApiError::BadRequest(_)
            | ApiError::InvalidScheduleUnit(_)
            | ApiError::InvalidWeekday(_)
            | ApiError::InvalidSchedule(_)
            | ApiError::InvalidStatusTransition { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::CatchUpFailed | ApiError::Database | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
