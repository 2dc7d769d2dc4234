use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    HttpMessage, HttpRequest,
};
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, LocalBoxFuture};
use log::{debug, warn};

use crate::{
    db,
    dto::AuthTokens,
    errors::ApiError,
    models::User,
    DbPool,
};

use self::jwt::TokenIssuer;

/// Where the current token pair of a user lives. The gate accepts a token
/// only while [`TokenStore::is_current`] holds for it.
pub trait TokenStore: Send + Sync {
    fn find_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>, ApiError>>;

    fn store_tokens<'a>(&'a self, user_id: &'a str, tokens: &'a AuthTokens) -> BoxFuture<'a, Result<(), ApiError>>;

    /// Swaps in `tokens` if `presented_refresh` is still the stored refresh
    /// token. Returns `false` otherwise.
    fn rotate<'a>(
        &'a self,
        user_id: &'a str,
        presented_refresh: &'a str,
        tokens: &'a AuthTokens,
    ) -> BoxFuture<'a, Result<bool, ApiError>>;

    /// Issuing a new pair overwrites the stored one, which revokes every
    /// earlier access token of the user.
    fn is_current(&self, user: &User, presented: &str) -> bool {
        user.access_token.as_deref() == Some(presented)
    }
}

pub struct SqlTokenStore {
    pool: DbPool,
}

impl SqlTokenStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TokenStore for SqlTokenStore {
    fn find_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>, ApiError>> {
        Box::pin(async move { Ok(db::user::get_by_id(user_id, &self.pool).await?) })
    }

    fn store_tokens<'a>(&'a self, user_id: &'a str, tokens: &'a AuthTokens) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            let updated = db::user::set_tokens(user_id, &tokens.access_token, &tokens.refresh_token, &self.pool).await?;
            if updated == 0 {
                return Err(ApiError::not_found("No user exists with 'id'."));
            }
            Ok(())
        })
    }

    fn rotate<'a>(
        &'a self,
        user_id: &'a str,
        presented_refresh: &'a str,
        tokens: &'a AuthTokens,
    ) -> BoxFuture<'a, Result<bool, ApiError>> {
        Box::pin(async move {
            Ok(db::user::rotate_tokens(
                user_id,
                presented_refresh,
                &tokens.access_token,
                &tokens.refresh_token,
                &self.pool,
            )
            .await?)
        })
    }
}

/// Resolves a bearer token to the user it was issued to.
#[derive(Clone)]
pub struct SessionGate {
    tokens: Arc<dyn TokenStore>,
    issuer: TokenIssuer,
}

impl SessionGate {
    pub fn new(tokens: Arc<dyn TokenStore>, issuer: TokenIssuer) -> Self {
        Self { tokens, issuer }
    }

    pub async fn authenticate(
        &self,
        header: Option<&str>,
        ignore_expiry: bool,
        now: DateTime<Utc>,
    ) -> Result<User, ApiError> {
        let token = match header {
            Some(value) => value.strip_prefix("Bearer ").unwrap_or(value).trim(),
            None => return Err(ApiError::bad_request("Missing header 'Authorization'.")),
        };

        let invalid = || ApiError::unauthorized("Invalid access token in 'Authorization' header.");
        let claims = self.issuer.decode(token).map_err(|err| {
            debug!("access token rejected: {}", err);
            invalid()
        })?;
        if !ignore_expiry && claims.exp < now.timestamp() {
            debug!("access token of {} expired", claims.id);
            return Err(invalid());
        }

        let user = match self.tokens.find_user(&claims.id).await? {
            Some(user) => user,
            None => return Err(invalid()),
        };
        if !self.tokens.is_current(&user, token) {
            warn!("revoked access token presented for user {}", user.id);
            return Err(invalid());
        }
        if user.is_blocked {
            return Err(ApiError::forbidden("Your account has been blocked by an admin."));
        }
        Ok(user)
    }
}

pub struct AuthMiddleware {
    gate: SessionGate,
    ignore_expiry: bool,
}

impl AuthMiddleware {
    pub fn new(gate: SessionGate) -> Self {
        Self {
            gate,
            ignore_expiry: false,
        }
    }

    /// Accepts expired but otherwise current tokens. Only for token refresh.
    pub fn ignoring_expiry(gate: SessionGate) -> Self {
        Self {
            gate,
            ignore_expiry: true,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            gate: self.gate.clone(),
            ignore_expiry: self.ignore_expiry,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    gate: SessionGate,
    ignore_expiry: bool,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = self.gate.clone();
        let ignore_expiry = self.ignore_expiry;
        Box::pin(async move {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .map(|value| value.to_str().unwrap_or_default().to_string());
            match gate.authenticate(header.as_deref(), ignore_expiry, Utc::now()).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

/// The user the gate resolved for this request.
pub fn authenticated_user(req: &HttpRequest) -> Result<User, ApiError> {
    req.extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Missing authenticated user."))
}

/// Checks the presented refresh token against the stored one and swaps in a
/// fresh pair.
pub async fn refresh(
    tokens: &dyn TokenStore,
    issuer: &TokenIssuer,
    user: &User,
    presented_refresh: &str,
    now: DateTime<Utc>,
) -> Result<AuthTokens, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid refresh token cannot be used to get new tokens.");
    if user.refresh_token.as_deref() != Some(presented_refresh) {
        return Err(invalid());
    }
    let fresh = issuer.issue(&user.id, &user.email, now)?;
    if !tokens.rotate(&user.id, presented_refresh, &fresh).await? {
        return Err(invalid());
    }
    debug!("tokens of user {} refreshed", user.id);
    Ok(fresh)
}

pub mod jwt {
    use chrono::{DateTime, Duration, Utc};
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use log::error;

    use crate::{
        dto::{AuthTokens, Claims},
        errors::ApiError,
        service::crypto,
    };

    /// Signs access tokens and mints refresh tokens.
    #[derive(Clone)]
    pub struct TokenIssuer {
        secret: String,
        ttl: Duration,
    }

    impl TokenIssuer {
        pub fn new(secret: &str, ttl: Duration) -> Self {
            Self {
                secret: secret.to_string(),
                ttl,
            }
        }

        pub fn encode(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> Result<String, ApiError> {
            let claims = Claims::new(user_id, email, (now + self.ttl).timestamp());
            let key = EncodingKey::from_secret(self.secret.as_bytes());
            encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|err| {
                error!("failed to encode access token: {:?}", err);
                ApiError::Internal
            })
        }

        /// Verifies signature and shape. Expiry is left to the caller.
        pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
            let key = DecodingKey::from_secret(self.secret.as_bytes());
            let mut validation = Validation::new(Algorithm::HS256);
            validation.validate_exp = false;
            decode::<Claims>(token, &key, &validation).map(|data| data.claims)
        }

        pub fn issue(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> Result<AuthTokens, ApiError> {
            Ok(AuthTokens {
                access_token: self.encode(user_id, email, now)?,
                refresh_token: crypto::random_token(),
            })
        }
    }

}
