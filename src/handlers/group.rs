use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::{
    dto::{GroupMemberStatusDto, NewGroupDto, PageQuery, UpdateGroupDto},
    errors::ApiError,
    models::JoinStatus,
    service::auth::authenticated_user,
    AppState,
};

#[post("")]
pub async fn create(
    req: HttpRequest,
    dto: web::Json<NewGroupDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    let group = state.groups.create(&user, dto.into_inner()).await?;
    info!("RESPONSE POST /groups: {}", group.group_id);
    Ok(HttpResponse::Created().json(group))
}

#[post("/update")]
pub async fn update(
    req: HttpRequest,
    dto: web::Json<UpdateGroupDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    state.groups.update(&user, dto.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[get("/many")]
pub async fn get_many(query: web::Query<PageQuery>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let groups = state.groups.list(query.offset()).await?;
    Ok(HttpResponse::Ok().json(groups))
}

#[get("/by-id/{id}")]
pub async fn get_by_id(id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let group = state.groups.get_by_id(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(group))
}

#[post("/by-id/{id}/members/join")]
pub async fn join(req: HttpRequest, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    state.groups.join(&user, id.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[post("/by-id/{id}/members/leave")]
pub async fn leave(req: HttpRequest, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    state.groups.leave(&user, id.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[post("/by-id/{id}/members/approve")]
pub async fn approve(
    req: HttpRequest,
    id: web::Path<Uuid>,
    dto: web::Json<GroupMemberStatusDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    state
        .groups
        .set_member_status(&user, id.into_inner(), &dto.user_id, JoinStatus::Member)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

#[post("/by-id/{id}/members/ban")]
pub async fn ban(
    req: HttpRequest,
    id: web::Path<Uuid>,
    dto: web::Json<GroupMemberStatusDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = authenticated_user(&req)?;
    state
        .groups
        .set_member_status(&user, id.into_inner(), &dto.user_id, JoinStatus::Banned)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(update)
        .service(get_many)
        .service(get_by_id)
        .service(join)
        .service(leave)
        .service(approve)
        .service(ban);
}
