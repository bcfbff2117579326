// Authenticated HTTP client for the Soracom API.
//
// Wraps `reqwest::Client` with base-URL construction and status mapping.
// The credential headers are injected as reqwest default headers at build
// time, so endpoint modules never touch the secrets. All endpoint groups
// (subscribers, port mappings, tags, speed class) are implemented as
// inherent methods via separate files to keep this module focused on
// transport mechanics.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

pub(crate) const API_KEY_HEADER: &str = "x-soracom-api-key";
pub(crate) const TOKEN_HEADER: &str = "x-soracom-token";

/// Authenticated client for the provider API.
///
/// `base_url` is the versioned API root, e.g. `https://g.api.soracom.io/v1`.
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client that sends the credential pair on every request.
    pub fn new(
        base_url: Url,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, header_value(credentials.api_key.expose_secret())?);
        headers.insert(TOKEN_HEADER, header_value(credentials.token.expose_secret())?);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for flows that need direct access).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path relative to the versioned root.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Map a response's status into the error taxonomy: 401/403 are fatal
    /// auth errors, any other non-2xx becomes `Error::Api` carrying the
    /// raw body. Returns the response untouched on success.
    pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: if body.is_empty() {
                    "invalid or expired API credentials".to_owned()
                } else {
                    body
                },
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp)
    }

    /// Deserialize a response body, keeping the raw text for diagnostics.
    pub(crate) async fn json_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

fn header_value(secret: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(secret).map_err(|_| Error::Authentication {
        message: "credential contains characters not valid in an HTTP header".to_owned(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}
