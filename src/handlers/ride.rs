use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    dto::{NewRideDto, PageQuery, UpdateRideDto},
    errors::ApiError,
    service::auth::authenticated_user,
    AppState,
};

#[post("")]
pub async fn create(
    req: HttpRequest,
    dto: web::Json<NewRideDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    let ride = state.rides.create(&user, dto.into_inner(), Utc::now()).await?;
    info!("RESPONSE POST /rides: {}", ride.ride_id);
    Ok(HttpResponse::Created().json(ride))
}

#[post("/update")]
pub async fn update(
    req: HttpRequest,
    dto: web::Json<UpdateRideDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    state.rides.update(&user, dto.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[get("/many")]
pub async fn get_many(query: web::Query<PageQuery>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rides = state.rides.list(query.offset(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(rides))
}

#[get("/by-id/{id}")]
pub async fn get_by_id(id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let ride = state.rides.get_by_id(id.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ride))
}

#[get("/upcoming/by-id/{id}")]
pub async fn get_upcoming_by_id(id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let ride = state.rides.get_upcoming_by_id(id.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ride))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(update)
        .service(get_many)
        .service(get_by_id)
        .service(get_upcoming_by_id);
}
