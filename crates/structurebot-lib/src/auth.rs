//! EVE SSO refresh-token exchange.

use std::fmt;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Default EVE SSO token endpoint.
pub const DEFAULT_LOGIN_URL: &str = "https://login.eveonline.com/v2/oauth/token";

/// Application credentials plus a long-lived refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct SsoCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for SsoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a refresh token for a short-lived access token.
///
/// # Errors
/// [`Error::Auth`] when the SSO rejects the credentials, [`Error::Http`] on
/// transport failures.
pub fn refresh_access_token(
    client: &Client,
    token_url: &str,
    credentials: &SsoCredentials,
) -> Result<String> {
    debug!(token_url, client_id = %credentials.client_id, "refreshing access token");
    let response = client
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.as_str()),
        ])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::Auth {
            message: format!("token endpoint returned {status}: {body}"),
        });
    }

    Ok(response.json::<TokenResponse>()?.access_token)
}
