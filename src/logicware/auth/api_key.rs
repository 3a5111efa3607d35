//! Authorize against the gateway's external-token endpoint.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use super::{AuthError, TokenProvider};

const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiKeyCredentials {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub subdomain: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    succeeded: bool,
    #[serde(default)]
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
    access_token: Option<String>,
}

impl ApiKeyCredentials {
    /// Exchange the API key / subdomain pair for a bearer token.
    async fn perform(&self) -> Result<String, AuthError> {
        let url = format!("{}/auth/external/token", self.base_url);

        debug!(message = "Requesting new token from LogicWare", url = %url);

        let res = self
            .client
            .post(url)
            .header("X-API-Key", &self.api_key)
            .header("X-Subdomain", &self.subdomain)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(AUTH_TIMEOUT)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(AuthError::Server {
                status_code: status.as_u16(),
            });
        }

        let body: TokenResponse = res.json().await?;
        match body {
            TokenResponse {
                succeeded: true,
                data:
                    Some(TokenData {
                        access_token: Some(token),
                    }),
            } if !token.is_empty() => Ok(token),
            _ => Err(AuthError::MalformedResponse),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for ApiKeyCredentials {
    async fn fetch_token(&self) -> Result<String, AuthError> {
        self.perform().await
    }
}
