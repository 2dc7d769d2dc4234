use futures_util::future::BoxFuture;
use log::error;
use serde::Deserialize;

use crate::{config::GoogleOauthConfig, dto::GoogleProfile, errors::ApiError};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/userinfo.profile";

/// External sign-in provider: where to send the browser, and how to turn
/// the code it comes back with into a profile.
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> String;

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<GoogleProfile, ApiError>>;

    /// Frontend page that receives the token pair.
    fn client_auth_url(&self) -> &str;
}

pub struct GoogleIdentity {
    client: reqwest::Client,
    config: GoogleOauthConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleIdentity {
    pub fn new(config: GoogleOauthConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    async fn fetch_profile(&self, code: &str) -> Result<GoogleProfile, ApiError> {
        let exchange_failed = || {
            ApiError::bad_request(
                "Error during code exchange. Make sure this request was started from '/auth/google/login'.",
            )
        };
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| {
                error!("google code exchange failed: {}", err);
                exchange_failed()
            })?
            .json()
            .await
            .map_err(|err| {
                error!("google token response unreadable: {}", err);
                exchange_failed()
            })?;

        let user_info_failed = |err: reqwest::Error| {
            error!("google userinfo request failed: {}", err);
            ApiError::bad_request("Failed to get user info from Google.")
        };
        self.client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(user_info_failed)?
            .json::<GoogleProfile>()
            .await
            .map_err(user_info_failed)
    }
}

impl IdentityProvider for GoogleIdentity {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            AUTHORIZE_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<GoogleProfile, ApiError>> {
        Box::pin(self.fetch_profile(code))
    }

    fn client_auth_url(&self) -> &str {
        &self.config.client_auth_url
    }
}
