use actix_web::{get, post, web, HttpRequest, HttpResponse};

use crate::{dto::BanStatusDto, errors::ApiError, service, AppState};

#[get("/me")]
pub async fn get_me(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = service::auth::authenticated_user(&req)?;
    Ok(HttpResponse::Ok().json(user))
}

#[get("/by-id/{id}")]
pub async fn get_by_id(id: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = service::user::get_by_id(&id.into_inner(), &state.pool).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[post("/by-id/{id}/ban-status")]
pub async fn set_ban_status(
    req: HttpRequest,
    id: web::Path<String>,
    dto: web::Json<BanStatusDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let admin = service::auth::authenticated_user(&req)?;
    service::user::set_ban_status(&state, &admin, &id.into_inner(), dto.is_banned).await?;
    Ok(HttpResponse::Ok().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_me).service(get_by_id).service(set_ban_status);
}
