use chrono::Utc;
use log::{error, info};

use crate::{
    db,
    dto::AuthTokens,
    errors::ApiError,
    models::{User, AUTH_PROVIDER_GOOGLE},
    AppState, DbPool,
};

pub async fn get_by_id(id: &str, pool: &DbPool) -> Result<User, ApiError> {
    match db::user::get_by_id(id, pool).await? {
        Some(user) => Ok(user),
        None => Err(ApiError::not_found("No user exists with 'id'.")),
    }
}

/// Finishes a Google sign-in for the callback that carried `oauth_state`
/// and `code`. Creates the user on first login and always issues a fresh
/// token pair, revoking the previous one.
pub async fn complete_login(app: &AppState, oauth_state: &str, code: &str) -> Result<AuthTokens, ApiError> {
    let identity = match &app.identity {
        Some(identity) => identity,
        None => return Err(ApiError::not_found("Google login is not configured.")),
    };
    if !app.oauth_states.consume(oauth_state) {
        return Err(ApiError::bad_request(
            "Invalid 'state' parameter. Make sure authentication requests are only started from '/auth/google/login'.",
        ));
    }
    let profile = identity.exchange_code(code).await?;
    if !profile.verified_email {
        return Err(ApiError::bad_request(
            "Google user has an unverified email address. This is not allowed.",
        ));
    }

    let user = match db::user::get_by_id(&profile.id, &app.pool).await? {
        Some(user) if user.provider != AUTH_PROVIDER_GOOGLE => {
            return Err(ApiError::bad_request(
                "The user already exists but was created with a different authentication method than Google.",
            ))
        }
        Some(user) => {
            db::user::update_name_and_email(&user.id, &profile.name, &profile.email, &app.pool).await?;
            user
        }
        None => {
            let user = db::user::create(&profile.id, &profile.name, &profile.email, AUTH_PROVIDER_GOOGLE, &app.pool)
                .await
                .map_err(|err| {
                    error!("failed to create user {} after Google authentication: {:?}", profile.id, err);
                    ApiError::Internal
                })?;
            info!("user {} created from Google profile", user.id);
            user
        }
    };

    let fresh = app.issuer.issue(&user.id, &profile.email, Utc::now())?;
    app.tokens.store_tokens(&user.id, &fresh).await?;
    Ok(fresh)
}

/// Blocks or unblocks `target`. Only ids listed in `ADMIN_USER_IDS` may
/// do this, and never on themselves.
pub async fn set_ban_status(app: &AppState, admin: &User, target: &str, is_banned: bool) -> Result<(), ApiError> {
    if !app.config.admin_user_ids.iter().any(|id| id == &admin.id) {
        return Err(ApiError::forbidden("You do not have the permission to ban users."));
    }
    if admin.id == target {
        return Err(ApiError::forbidden("Not allowed to change your own ban status."));
    }
    if db::user::set_blocked(target, is_banned, &app.pool).await? == 0 {
        return Err(ApiError::not_found("No user exists with 'id'."));
    }
    info!("user {} set ban status of {} to {}", admin.id, target, is_banned);
    Ok(())
}
