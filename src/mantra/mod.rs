//! Mantra contact-platform forwarder.
//!
//! Mantra does not use the LogicWare bearer token; it authenticates with a
//! static group-id/api-key pair embedded in the payload body.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::relay::{self, Relayed};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_COUNTRY_CODE: &str = "51";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
}

pub struct Client {
    pub http: reqwest::Client,
    pub base_url: String,
    pub group_id: String,
    pub api_key: String,
    pub tag_id: String,
}

/// Non-qualified contact as the frontend sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub phone: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
    pub email: Option<String>,
    #[serde(rename = "custom_1")]
    pub custom_1: Option<String>,
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_owned()
}

impl Client {
    /// POST the contact to Mantra, relaying the response verbatim. Optional
    /// fields are included only when present.
    pub async fn send_contact(&self, contact: &Contact) -> Result<Relayed, Error> {
        let url = format!("{}/contacts/new", self.base_url);

        let mut data = json!({
            "name": contact.name,
            "phone": contact.phone,
            "countryCode": contact.country_code,
            "tagIds": [self.tag_id],
        });
        // Empty form fields come through as "", which Mantra treats as a
        // value; forward them only when actually filled in.
        if let Some(email) = contact.email.as_deref().filter(|email| !email.is_empty()) {
            data["email"] = json!(email);
        }
        if let Some(custom_1) = contact.custom_1.as_deref().filter(|custom| !custom.is_empty()) {
            data["custom_1"] = json!(custom_1);
        }
        let payload = json!({
            "groupId": self.group_id,
            "apiKey": self.api_key,
            "data": data,
        });

        debug!(message = "Sending non-qualified contact to Mantra", url = %url);

        let res = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        Ok(relay::passthrough(res).await?)
    }
}
