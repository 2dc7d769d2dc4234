use actix_web::{get, http::header::LOCATION, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;

use crate::{
    dto::{OauthCallbackQuery, RefreshTokensDto},
    errors::ApiError,
    service::{self, auth::{AuthMiddleware, SessionGate}},
    AppState,
};

pub async fn refresh(
    req: HttpRequest,
    dto: web::Json<RefreshTokensDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = service::auth::authenticated_user(&req)?;
    let tokens = service::auth::refresh(
        state.tokens.as_ref(),
        &state.issuer,
        &user,
        &dto.refresh_token,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[get("/google/login")]
pub async fn google_login(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let identity = match &state.identity {
        Some(identity) => identity,
        None => return Err(ApiError::not_found("Google login is not configured.")),
    };
    let oauth_state = state.oauth_states.issue();
    let url = identity.authorize_url(&oauth_state);
    info!("redirecting to Google login, {} pending states", state.oauth_states.len());
    Ok(HttpResponse::TemporaryRedirect()
        .insert_header((LOCATION, url))
        .finish())
}

/// Google redirects here with `state` and `code`. The browser is sent on
/// to the client with the new token pair in the query.
#[get("/google/callback")]
pub async fn google_callback(
    query: web::Query<OauthCallbackQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (oauth_state, code) = match (&query.state, &query.code) {
        (Some(oauth_state), Some(code)) => (oauth_state, code),
        _ => return Err(ApiError::bad_request("Query parameters 'state' and 'code' are required.")),
    };
    let tokens = service::user::complete_login(&state, oauth_state, code).await?;
    let client_auth_url = match &state.identity {
        Some(identity) => identity.client_auth_url(),
        None => return Err(ApiError::Internal),
    };
    let url = format!(
        "{}?accessToken={}&refreshToken={}",
        client_auth_url,
        urlencoding::encode(&tokens.access_token),
        urlencoding::encode(&tokens.refresh_token),
    );
    Ok(HttpResponse::TemporaryRedirect()
        .insert_header((LOCATION, url))
        .finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig, gate: SessionGate) {
    cfg.service(
        web::resource("/refresh")
            .wrap(AuthMiddleware::ignoring_expiry(gate))
            .route(web::post().to(refresh)),
    )
    .service(google_login)
    .service(google_callback);
}
