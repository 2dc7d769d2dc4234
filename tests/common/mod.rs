//! Shared fixtures: a throwaway sqlite file per test, seeded users and
//! the app wired exactly like `main` does it.

#![allow(dead_code, unused_macros)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::BoxFuture;
use ride_sharing_api::{
    config::Config,
    db,
    dto::{AuthTokens, GoogleProfile},
    errors::ApiError,
    models::{User, AUTH_PROVIDER_GOOGLE},
    service::identity::IdentityProvider,
    AppState, DbPool,
};
use tempfile::TempDir;

pub const SECRET: &str = "test-access-token-secret";
pub const ADMIN_ID: &str = "admin-1";
pub const CLIENT_AUTH_URL: &str = "https://app.example.com/auth";

/// Builds the service with every route mounted. Yields `(web::Data<AppState>, app)`.
macro_rules! init_app {
    ($db:expr) => {
        init_app!($db, crate::common::test_state($db))
    };
    ($db:expr, $state:expr) => {{
        let state = ::actix_web::web::Data::new($state);
        let shared = state.clone();
        let app = ::actix_web::test::init_service(
            ::actix_web::App::new().configure(move |cfg| ::ride_sharing_api::configure_app(cfg, &shared)),
        )
        .await;
        (state, app)
    }};
}

pub fn bearer(tokens: &AuthTokens) -> (actix_web::http::header::HeaderName, String) {
    (actix_web::http::header::AUTHORIZATION, format!("Bearer {}", tokens.access_token))
}

pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

pub async fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("rides.db").display());
    let pool = db::init_db_pool(&url).await.expect("database");
    TestDb { pool, _dir: dir }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host_addr: "127.0.0.1:0".to_string(),
        access_token_secret: SECRET.to_string(),
        access_token_ttl: chrono::Duration::hours(24),
        oauth_state_ttl: Duration::from_secs(300),
        rides_page_size: 50,
        admin_user_ids: vec![ADMIN_ID.to_string()],
        google: None,
    }
}

pub fn test_state(db: &TestDb) -> AppState {
    AppState::new(db.pool.clone(), test_config())
}

/// Stands in for Google: each known code yields a fixed profile.
pub struct FakeIdentity {
    profiles: HashMap<String, GoogleProfile>,
}

impl FakeIdentity {
    pub fn new(profiles: Vec<(&str, GoogleProfile)>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|(code, profile)| (code.to_string(), profile)).collect(),
        }
    }
}

impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.example.com/auth?state={state}")
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<GoogleProfile, ApiError>> {
        let profile = self.profiles.get(code).cloned();
        Box::pin(async move { profile.ok_or_else(|| ApiError::bad_request("Error during code exchange.")) })
    }

    fn client_auth_url(&self) -> &str {
        CLIENT_AUTH_URL
    }
}

pub fn google_profile(id: &str, email: &str, verified: bool) -> GoogleProfile {
    GoogleProfile {
        id: id.to_string(),
        email: email.to_string(),
        verified_email: verified,
        name: "Ada".to_string(),
    }
}

pub fn test_state_with_identity(db: &TestDb, identity: FakeIdentity) -> AppState {
    let mut state = test_state(db);
    state.identity = Some(Arc::new(identity));
    state
}

/// Inserts a google user and gives it a current token pair.
pub async fn seed_user(state: &AppState, id: &str, email: &str) -> (User, AuthTokens) {
    let user = db::user::create(id, id, email, AUTH_PROVIDER_GOOGLE, &state.pool)
        .await
        .expect("user");
    let tokens = state.issuer.issue(id, email, Utc::now()).expect("tokens");
    state.tokens.store_tokens(id, &tokens).await.expect("store tokens");
    let user = db::user::get_by_id(&user.id, &state.pool).await.expect("reload").expect("user exists");
    (user, tokens)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub async fn count_events(pool: &DbPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ride_events")
        .fetch_one(pool)
        .await
        .expect("count")
}

pub async fn count_events_with_status(pool: &DbPool, status: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ride_events WHERE status = $1")
        .bind(status)
        .fetch_one(pool)
        .await
        .expect("count")
}
