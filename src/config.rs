use std::env;
use std::time::Duration;

use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display(fmt = "required environment variable '{}' is not set", _0)]
    Missing(#[error(not(source))] &'static str),

    #[display(fmt = "environment variable '{}' has an invalid value", _0)]
    Invalid(#[error(not(source))] &'static str),
}

#[derive(Debug, Clone)]
pub struct GoogleOauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Frontend page that receives the token pair after a successful login.
    pub client_auth_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host_addr: String,
    pub access_token_secret: String,
    pub access_token_ttl: chrono::Duration,
    pub oauth_state_ttl: Duration,
    pub rides_page_size: i64,
    pub admin_user_ids: Vec<String>,
    pub google: Option<GoogleOauthConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let access_token_secret = required("ACCESS_TOKEN_SECRET")?;
        let host_addr = env::var("HOST_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let access_token_ttl = chrono::Duration::hours(parse_or("ACCESS_TOKEN_TTL_HOURS", 24)?);
        let oauth_state_ttl = Duration::from_secs(parse_or("OAUTH_STATE_TTL_SECS", 300)?);
        if oauth_state_ttl.is_zero() {
            return Err(ConfigError::Invalid("OAUTH_STATE_TTL_SECS"));
        }
        let rides_page_size = parse_or("RIDES_PAGE_SIZE", 50)?;
        if rides_page_size <= 0 {
            return Err(ConfigError::Invalid("RIDES_PAGE_SIZE"));
        }

        let admin_user_ids = env::var("ADMIN_USER_IDS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let google = match env::var("GOOGLE_CLIENT_ID") {
            Ok(client_id) => Some(GoogleOauthConfig {
                client_id,
                client_secret: required("GOOGLE_CLIENT_SECRET")?,
                redirect_url: required("GOOGLE_REDIRECT_URL")?,
                client_auth_url: required("CLIENT_AUTH_URL")?,
            }),
            Err(_) => None,
        };

        Ok(Config {
            database_url,
            host_addr,
            access_token_secret,
            access_token_ttl,
            oauth_state_ttl,
            rides_page_size,
            admin_user_ids,
            google,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_list_skips_blanks() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
