//! Verbatim pass-through of upstream responses.

use serde_json::Value;

/// An upstream response relayed to the frontend unchanged: the upstream's
/// HTTP status code and its parsed JSON body, for success and error
/// statuses alike.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub status: u16,
    pub body: Value,
}

/// Captures an upstream response for relaying. Fails only when the body is
/// not JSON or the transport drops mid-read; upstream 4xx/5xx statuses are
/// relayed, not treated as errors.
pub async fn passthrough(res: reqwest::Response) -> Result<Relayed, reqwest::Error> {
    let status = res.status().as_u16();
    let body = res.json().await?;
    Ok(Relayed { status, body })
}
