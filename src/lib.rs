pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use std::sync::Arc;

use actix_web::{error::JsonPayloadError, web, HttpRequest};
use sqlx::{Pool, Sqlite};

use config::Config;
use errors::ApiError;
use service::{
    auth::{jwt::TokenIssuer, AuthMiddleware, SessionGate, SqlTokenStore, TokenStore},
    group::GroupService,
    identity::{GoogleIdentity, IdentityProvider},
    oauth_state::OAuthStateCache,
    ride::RideService,
};

pub type DbPool = Pool<Sqlite>;

/// Everything the handlers share. Built once in `main` and handed to actix
/// as `web::Data`.
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub rides: RideService,
    pub groups: GroupService,
    pub tokens: Arc<dyn TokenStore>,
    pub issuer: TokenIssuer,
    pub oauth_states: OAuthStateCache,
    /// `None` when Google login is not configured.
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        Self {
            rides: RideService::new(pool.clone(), config.rides_page_size),
            groups: GroupService::new(pool.clone(), config.rides_page_size),
            tokens: Arc::new(SqlTokenStore::new(pool.clone())),
            issuer: TokenIssuer::new(&config.access_token_secret, config.access_token_ttl),
            oauth_states: OAuthStateCache::new(config.oauth_state_ttl),
            identity: config
                .google
                .clone()
                .map(|google| Arc::new(GoogleIdentity::new(google)) as Arc<dyn IdentityProvider>),
            pool,
            config,
        }
    }

    pub fn gate(&self) -> SessionGate {
        SessionGate::new(Arc::clone(&self.tokens), self.issuer.clone())
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Deserialize(err) if err.is_data() => ApiError::Validation(err.to_string()).into(),
        err => ApiError::InvalidJson(err.to_string()).into(),
    }
}

/// Mounts every route. Used by `main` and by the integration tests.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: &web::Data<AppState>) {
    let gate = state.gate();
    cfg.app_data(state.clone())
        .app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(
            web::PathConfig::default()
                .error_handler(|_, _| ApiError::not_found("No resource exists for the given 'id'.").into()),
        )
        .service(
            web::scope("/rides")
                .wrap(AuthMiddleware::new(gate.clone()))
                .configure(handlers::ride::init_routes),
        )
        .service(
            web::scope("/groups")
                .wrap(AuthMiddleware::new(gate.clone()))
                .configure(handlers::group::init_routes),
        )
        .service(
            web::scope("/users")
                .wrap(AuthMiddleware::new(gate.clone()))
                .configure(handlers::user::init_routes),
        )
        .service(web::scope("/auth").configure(|cfg| handlers::auth::init_routes(cfg, gate)));
}
