//! LogicWare gateway forwarder.

use std::{sync::Arc, time::Duration};

use reqwest::{
    header::{ACCEPT, CONTENT_TYPE, USER_AGENT},
    Method, RequestBuilder,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::relay::{self, Relayed};

pub mod auth;

use auth::{AuthError, TokenManager};

const CLIENT_USER_AGENT: &str = "Casa-Bonita-Proxy/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_PROJECT_CODE: &str = "CASABONITA";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("auth: {0}")]
    Auth(#[from] AuthError),
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Forwards inventory and lead calls to the gateway, attaching the bearer
/// token from the shared [`TokenManager`] plus the fixed tenant headers.
pub struct Client {
    pub http: reqwest::Client,
    pub base_url: String,
    pub subdomain: String,
    pub tokens: Arc<TokenManager>,
}

/// Lead submission body as the frontend sends it; field names follow the
/// gateway's camelCase wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub portal_code: String,
    pub project_code: String,
    pub document_type: i64,
    pub first_name: String,
    pub paternal_lastname: Option<String>,
    pub maternal_lastname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub comment: Option<String>,
}

impl Client {
    fn build_request(&self, auth_token: &str, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(auth_token)
            .header("X-Subdomain", &self.subdomain)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
    }

    /// GET the available unit stock for a project, relayed verbatim.
    pub async fn units_stock(&self, project_code: &str) -> Result<Relayed, Error> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}/external/units/stock", self.base_url);

        debug!(message = "Proxying stock request", url = %url, project_code);

        let res = self
            .build_request(&token.access_token, Method::GET, &url)
            .query(&[("projectCode", project_code)])
            .send()
            .await?;

        Ok(relay::passthrough(res).await?)
    }

    /// POST a new lead, with empty fields stripped from the body first.
    pub async fn create_lead(&self, lead: &Lead) -> Result<Relayed, Error> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}/external/leads/create", self.base_url);
        let body = strip_empty_fields(serde_json::to_value(lead)?);

        debug!(message = "Creating lead", url = %url);

        let res = self
            .build_request(&token.access_token, Method::POST, &url)
            .json(&body)
            .send()
            .await?;

        Ok(relay::passthrough(res).await?)
    }
}

/// Drops every top-level field whose value is `""`, numeric zero, `null`,
/// `[]`, or `{}`. The gateway rejects some fields when they are present but
/// empty, while absent ones are fine. `false` and non-empty values stay.
pub fn strip_empty_fields(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, val)| !is_empty(val))
                .collect(),
        ),
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Number(num) => num.as_f64() == Some(0.0),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_empty_values() {
        let body = json!({
            "portalCode": "WEB",
            "documentType": 0,
            "firstName": "Juan",
            "email": "",
            "comment": null,
            "tags": [],
            "extra": {},
        });
        let stripped = strip_empty_fields(body);
        assert_eq!(stripped, json!({"portalCode": "WEB", "firstName": "Juan"}));
    }

    #[test]
    fn keeps_false_and_nonempty_values() {
        let body = json!({
            "marketingConsent": false,
            "documentType": 1,
            "tags": ["web"],
        });
        assert_eq!(strip_empty_fields(body.clone()), body);
    }

    #[test]
    fn stripping_is_idempotent() {
        let body = json!({
            "firstName": "Juan",
            "email": "",
            "codSeller": 0,
        });
        let once = strip_empty_fields(body);
        let twice = strip_empty_fields(once.clone());
        assert_eq!(once, twice);
    }
}
