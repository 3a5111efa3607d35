//! Authorization logic for the LogicWare gateway.

pub mod api_key;
pub mod token_manager;

pub use api_key::ApiKeyCredentials;
pub use token_manager::{Record, TokenManager, TokenState, TokenStatus};

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("{status_code} status code from the token endpoint")]
    Server { status_code: u16 },
    #[error("token response invalid - no accessToken found")]
    MalformedResponse,
}

/// Performs one authentication exchange and yields a bearer token. The
/// expiry bookkeeping lives in [`TokenManager`], not here.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<String, AuthError>;
}

/// Injectable wall-clock source so expiry can be tested deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
