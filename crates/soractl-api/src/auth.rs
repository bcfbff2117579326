// Operator authentication.
//
// `POST /auth` exchanges email+password for an {apiKey, token} pair that
// every subsequent request carries as headers. The pair is opaque to the
// rest of the system.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Opaque credential pair issued by `POST /auth`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub token: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            token: SecretString::from(token.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "apiKey")]
    api_key: String,
    token: String,
}

/// Authenticate an operator with email and password.
///
/// Any non-2xx is an `Error::Authentication` — there is no retry policy
/// for login; bad credentials are bad credentials.
pub async fn authenticate(
    base_url: &Url,
    email: &str,
    password: &SecretString,
    transport: &TransportConfig,
) -> Result<Credentials, Error> {
    let http = transport.build_client()?;
    let url = Url::parse(&format!(
        "{}/auth",
        base_url.as_str().trim_end_matches('/')
    ))?;

    debug!(%url, email, "authenticating");

    let resp = http
        .post(url)
        .json(&json!({ "email": email, "password": password.expose_secret() }))
        .send()
        .await
        .map_err(Error::Transport)?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("login rejected (HTTP {}): {body}", status.as_u16()),
        });
    }

    let auth: AuthResponse = ApiClient::json_body(resp).await?;
    Ok(Credentials::new(auth.api_key, auth.token))
}

impl ApiClient {
    /// Release the API token.
    ///
    /// Best-effort: a 403 or connection failure still counts as logged out,
    /// since the token expires server-side regardless.
    pub async fn logout(&self) {
        let Ok(url) = self.url("auth/logout") else {
            return;
        };

        match self.http().post(url).send().await {
            Ok(resp) => debug!(status = resp.status().as_u16(), "logged out"),
            Err(err) => warn!(error = %err, "logout request failed; token will expire server-side"),
        }
    }
}
